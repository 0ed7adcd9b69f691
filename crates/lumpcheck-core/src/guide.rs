//! Static educational text shown alongside predictions.

use crate::decision::Label;

pub const BENIGN_FINDINGS: &str = "\
Benign findings
  - Growth pattern: non-invasive, localized
  - Borders: well-defined, smooth margins
  - Growth rate: slow or stable
  - Histology: normal cell structure, no atypia
  Typical examples: fibroadenoma, cysts, fibrocystic changes";

pub const MALIGNANT_FINDINGS: &str = "\
Malignant findings
  - Growth pattern: invasive, may spread (metastasis)
  - Borders: irregular or spiculated
  - Growth rate: rapid
  - Histology: atypical cells with abnormal nuclei
  Typical examples: invasive ductal or lobular carcinoma";

pub const FEATURE_EXPLANATION: &str = "\
The model relies heavily on:
  - Concave points (mean/worst): irregularities in tumor shape.
    Higher values usually mean malignancy.
  - Radius & perimeter (mean/worst): larger sizes often correspond to invasive tumors.
  - Area (mean/worst): larger mass area tends to indicate cancerous growth.
  - Concavity (mean/worst): inward curvature of the tumor boundary.

When several shape-related features show large or irregular values the
model leans toward malignant; otherwise it suggests benign.";

pub const DISCLAIMER: &str =
    "Developed for educational and research purposes only. Not a medical diagnostic tool.";

pub fn headline(label: Label) -> &'static str {
    match label {
        Label::Malignant => "The model predicts: Malignant (cancerous tumor)",
        Label::Benign => "The model predicts: Benign (non-cancerous tumor)",
    }
}

/// One-sentence interpretation of a label.
pub fn reason(label: Label) -> &'static str {
    match label {
        Label::Malignant => {
            "High values in area, radius, or concavity suggest irregular and invasive \
             cell growth patterns consistent with malignancy."
        }
        Label::Benign => {
            "Features suggest small, smooth, and localized growth, typical of benign lesions."
        }
    }
}

/// Full guide: findings for both classes, feature explanation, disclaimer.
pub fn full_text() -> String {
    [BENIGN_FINDINGS, MALIGNANT_FINDINGS, FEATURE_EXPLANATION, DISCLAIMER].join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_differs_per_label() {
        assert!(reason(Label::Malignant).contains("malignancy"));
        assert!(reason(Label::Benign).contains("benign"));
        assert!(headline(Label::Benign).contains("Benign"));
    }

    #[test]
    fn full_text_ends_with_disclaimer() {
        let text = full_text();
        assert!(text.starts_with("Benign findings"));
        assert!(text.ends_with(DISCLAIMER));
        assert!(text.contains("Concave points"));
    }
}
