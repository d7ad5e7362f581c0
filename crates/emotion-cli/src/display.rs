//! Human-readable training summary.

use emotion_ai::training::TrainingReport;
use emotion_ai::{EmotionModel, ModelError};

const BAR_WIDTH: usize = 30;

/// Classified after every training run as a quick sanity check.
pub const SAMPLE_SENTENCES: [&str; 7] = [
    "I am so happy today!",
    "This is the worst day ever.",
    "I feel really sad and alone.",
    "You are such a wonderful friend.",
    "I am nervous about tomorrow's exam.",
    "I can’t believe this happened!",
    "Everything feels peaceful now.",
];

/// Print a training report to stderr.
pub fn print_report(report: &TrainingReport, classifier: &str) {
    eprint!("{}", render_report(report, classifier));
}

fn render_report(report: &TrainingReport, classifier: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("  Classifier:  {classifier}\n"));
    out.push_str(&format!(
        "  Samples:     {} ({} skipped)\n",
        report.samples, report.skipped
    ));
    out.push_str(&format!("  Vocabulary:  {}\n", report.vocabulary_size));
    out.push_str(&format!(
        "  Train acc:   {:.1}%\n",
        report.train_accuracy * 100.0
    ));

    let width = report
        .class_counts
        .iter()
        .map(|(label, _)| label.len())
        .max()
        .unwrap_or(0);
    let largest = report
        .class_counts
        .iter()
        .map(|(_, n)| *n)
        .max()
        .unwrap_or(0)
        .max(1);

    out.push_str("  Classes:\n");
    for (label, count) in &report.class_counts {
        let bar = "#".repeat(count * BAR_WIDTH / largest);
        out.push_str(&format!("    {label:<width$}  {count:>6}  {bar}\n"));
    }
    out
}

/// Print the model's predictions for [`SAMPLE_SENTENCES`] to stderr.
pub fn print_samples(model: &EmotionModel) -> Result<(), ModelError> {
    eprint!("{}", render_samples(model)?);
    Ok(())
}

fn render_samples(model: &EmotionModel) -> Result<String, ModelError> {
    let width = SAMPLE_SENTENCES.iter().map(|s| s.chars().count()).max().unwrap_or(0);
    let mut out = String::from("  Sample predictions:\n");
    for sentence in SAMPLE_SENTENCES {
        let p = model.predict(sentence)?;
        out.push_str(&format!(
            "    {sentence:<width$}  {} ({:.2})\n",
            p.emotion, p.confidence
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use emotion_ai::training::{TrainingParams, TrainingSample, train};

    use super::*;

    #[test]
    fn renders_class_bars() {
        let report = TrainingReport {
            samples: 30,
            skipped: 1,
            class_counts: vec![("joy".into(), 20), ("sadness".into(), 10)],
            vocabulary_size: 120,
            train_accuracy: 0.9,
        };
        let text = render_report(&report, "multinomial_nb");
        assert!(text.contains("multinomial_nb"));
        assert!(text.contains("30 (1 skipped)"));
        assert!(text.contains("90.0%"));
        assert!(text.contains(&format!("joy          20  {}", "#".repeat(30))));
        assert!(text.contains(&format!("sadness      10  {}", "#".repeat(15))));
    }

    #[test]
    fn renders_one_line_per_sample_sentence() {
        let corpus: Vec<TrainingSample> = [
            ("I am so happy today", "joy"),
            ("what a wonderful friend", "joy"),
            ("I feel sad and alone", "sadness"),
            ("the worst day ever", "sadness"),
        ]
        .into_iter()
        .map(|(text, emotion)| TrainingSample {
            text: text.into(),
            emotion: emotion.into(),
        })
        .collect();
        let model = train(&corpus, &TrainingParams::default()).unwrap().model;

        let text = render_samples(&model).unwrap();
        assert_eq!(text.lines().count(), SAMPLE_SENTENCES.len() + 1);
        for sentence in SAMPLE_SENTENCES {
            assert!(text.contains(sentence), "{sentence}");
        }
        let happy = text.lines().find(|l| l.contains("so happy today")).unwrap();
        assert!(happy.contains(" joy ("), "{happy}");
    }
}
