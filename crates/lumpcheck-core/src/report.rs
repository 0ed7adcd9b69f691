//! Output formatting for single predictions and batch runs.

use crate::decision::{DecisionMode, Label, Prediction};
use crate::guide;
use crate::pipeline::BatchOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {s}. Use 'text' or 'json'.")),
        }
    }
}

pub fn render_prediction(prediction: &Prediction, format: OutputFormat, with_guide: bool) -> String {
    match format {
        OutputFormat::Text => prediction_text(prediction, with_guide),
        OutputFormat::Json => prediction_json(prediction),
    }
}

pub fn render_batch(outcome: &BatchOutcome, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => batch_text(outcome),
        OutputFormat::Json => batch_json(outcome),
    }
}

fn prediction_text(prediction: &Prediction, with_guide: bool) -> String {
    let mut out = Vec::new();
    let rule = "=".repeat(70);

    if with_guide {
        out.push(guide::BENIGN_FINDINGS.to_string());
        out.push(String::new());
        out.push(guide::MALIGNANT_FINDINGS.to_string());
        out.push(String::new());
    }

    out.push(rule.clone());
    out.push("PREDICTION PROBABILITY".to_string());
    out.push(rule.clone());
    out.push(format!(
        "  Benign:    {:.2}%",
        prediction.probabilities.benign_percent()
    ));
    out.push(format!(
        "  Malignant: {:.2}%",
        prediction.probabilities.malignant_percent()
    ));
    match (prediction.mode, prediction.threshold) {
        (DecisionMode::ProbabilityThreshold, Some(t)) => {
            out.push(format!("  Custom decision threshold applied: {t}"));
        }
        _ => out.push("  Direct label from model (no threshold applied)".to_string()),
    }
    if prediction.borderline {
        out.push("  Borderline: malignant probability lies in the 55-85% review band".to_string());
    }

    out.push(String::new());
    out.push("RESULT:".to_string());
    out.push(format!("  {}", guide::headline(prediction.label)));
    out.push(String::new());
    out.push("Why this prediction?".to_string());
    out.push(guide::FEATURE_EXPLANATION.to_string());
    out.push(String::new());
    out.push(format!("Interpretation summary: {}", guide::reason(prediction.label)));
    out.push(rule);
    out.push(guide::DISCLAIMER.to_string());

    out.join("\n")
}

fn prediction_json(prediction: &Prediction) -> String {
    let output = serde_json::json!({
        "prediction": prediction,
        "benign_percent": round2(prediction.probabilities.benign_percent()),
        "malignant_percent": round2(prediction.probabilities.malignant_percent()),
        "reason": guide::reason(prediction.label),
    });
    serde_json::to_string_pretty(&output).unwrap_or_default()
}

fn batch_text(outcome: &BatchOutcome) -> String {
    let summary = outcome.summary();
    let input = outcome.input();
    let rule = "=".repeat(70);
    let mut out = vec![
        String::new(),
        rule.clone(),
        format!("BATCH RESULTS (threshold: {})", outcome.threshold()),
        rule.clone(),
    ];

    let malignant: Vec<_> = outcome
        .predictions()
        .iter()
        .enumerate()
        .filter(|(_, p)| p.label == Label::Malignant)
        .collect();
    if !malignant.is_empty() {
        out.push(String::new());
        out.push(format!("MALIGNANT ROWS ({}):", malignant.len()));
        for (i, p) in &malignant {
            let marker = if p.borderline { "  [borderline]" } else { "" };
            out.push(format!(
                "  row {:>4}  [{:6.2}%]{}",
                i + 1,
                p.probabilities.malignant_percent(),
                marker
            ));
        }
    }

    let borderline_benign: Vec<_> = outcome
        .predictions()
        .iter()
        .enumerate()
        .filter(|(_, p)| p.borderline && p.label == Label::Benign)
        .collect();
    if !borderline_benign.is_empty() {
        out.push(String::new());
        out.push(format!("BORDERLINE BENIGN ROWS ({}):", borderline_benign.len()));
        for (i, p) in &borderline_benign {
            out.push(format!(
                "  row {:>4}  [{:6.2}%]",
                i + 1,
                p.probabilities.malignant_percent()
            ));
        }
    }

    out.push(String::new());
    out.push("SUMMARY:".to_string());
    out.push(format!("  Rows processed: {}", summary.total));
    out.push(format!("  Columns:        {}", input.headers().len()));
    out.push(format!("  Malignant:      {}", summary.malignant));
    out.push(format!("  Benign:         {}", summary.benign));
    out.push(format!("  Borderline:     {}", summary.borderline));
    out.push(rule);

    out.join("\n")
}

fn batch_json(outcome: &BatchOutcome) -> String {
    let rows: Vec<_> = outcome
        .predictions()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            serde_json::json!({
                "row": i + 1,
                "label": p.label,
                "benign_percent": round2(p.probabilities.benign_percent()),
                "malignant_percent": round2(p.probabilities.malignant_percent()),
                "borderline": p.borderline,
            })
        })
        .collect();

    let output = serde_json::json!({
        "threshold": outcome.threshold(),
        "results": rows,
        "summary": outcome.summary(),
    });
    serde_json::to_string_pretty(&output).unwrap_or_default()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{ProbabilityPair, Threshold};

    fn probabilistic(malignant: f64) -> Prediction {
        Prediction::from_probabilities(
            ProbabilityPair::from_malignant(malignant).unwrap(),
            Threshold::default(),
        )
    }

    #[test]
    fn output_format_parses_case_insensitively() {
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn text_shows_percentages_and_threshold() {
        let text = render_prediction(&probabilistic(0.9), OutputFormat::Text, false);
        assert!(text.contains("Benign:    10.00%"));
        assert!(text.contains("Malignant: 90.00%"));
        assert!(text.contains("Custom decision threshold applied: 0.4\n"));
        assert!(text.contains("Malignant (cancerous tumor)"));
        assert!(text.ends_with(guide::DISCLAIMER));
        assert!(!text.contains("Benign findings"));
    }

    #[test]
    fn text_shows_the_exact_threshold_applied() {
        let prediction = Prediction::from_probabilities(
            ProbabilityPair::from_malignant(0.558).unwrap(),
            Threshold::new(0.555).unwrap(),
        );
        let text = render_prediction(&prediction, OutputFormat::Text, false);

        assert!(text.contains("Malignant: 55.80%"));
        assert!(text.contains("Custom decision threshold applied: 0.555\n"));
        assert!(text.contains("Malignant (cancerous tumor)"));
    }

    #[test]
    fn text_with_guide_includes_findings() {
        let text = render_prediction(&probabilistic(0.1), OutputFormat::Text, true);
        assert!(text.starts_with("Benign findings"));
        assert!(text.contains("Malignant findings"));
        assert!(text.contains(guide::reason(Label::Benign)));
    }

    #[test]
    fn text_for_direct_label_mentions_no_threshold() {
        let text = render_prediction(
            &Prediction::from_label(Label::Benign),
            OutputFormat::Text,
            false,
        );
        assert!(text.contains("Direct label from model"));
        assert!(!text.contains("threshold applied:"));
    }

    #[test]
    fn json_contains_label_and_rounded_percentages() {
        let json = render_prediction(&probabilistic(0.123456), OutputFormat::Json, false);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["prediction"]["label"], "Benign");
        assert_eq!(value["malignant_percent"], 12.35);
        assert_eq!(value["benign_percent"], 87.65);
    }
}
