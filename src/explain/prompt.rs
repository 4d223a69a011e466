use crate::inference::ClassLabel;

/// Builds the prompt sent to the text generator for a consensus result.
///
/// `confidence` is a fraction in `[0, 1]` and is rendered as a percentage
/// with two decimals.
pub fn explanation_prompt(label: ClassLabel, confidence: f64) -> String {
    let percent = format!("{:.2}%", confidence * 100.0);
    format!(
        "You are an expert astronomer and data scientist.\n\
         My ensemble model just made a prediction with the following consensus results:\n\
         \n\
         - Predicted Class: {label}\n\
         - Model Consensus Confidence: {percent}\n\
         \n\
         Please provide a detailed, two-paragraph explanation for this result,\n\
         formatted for a web UI (use newlines).\n\
         \n\
         Paragraph 1: Start by clearly explaining what a \"{label}\" is\n\
         in simple astronomical terms (e.g., \"A QSO, or Quasi-Stellar Object, is...\").\n\
         \n\
         Paragraph 2: Explain what this specific prediction means. Why might the\n\
         models have reached this consensus with {percent} confidence?\n\
         What makes it different from the other classes (STAR, GALAXY, QSO)?\n\
         \n\
         Keep the tone professional, informative, and accessible.\n",
        label = label,
        percent = percent,
    )
}
