/// Asks for a plain-text explanation structured under the detail headings.
pub fn disease_details(disease: &str) -> String {
    format!(
        "Explain the disease '{}' in simple terms. \
         Structure the response using clear headings (like 'Symptoms:', 'Causes:', etc.) \
         followed by numbered or hyphen-style bullet points (without using asterisks). \
         Use only clean formatting like:\n\
         Symptoms:\n- ...\n- ...\nCauses:\n- ...\n\
         Do not use asterisks or markdown symbols like *, **, #, etc.",
        disease
    )
}

pub fn chat(message: &str) -> String {
    format!("You are a helpful health assistant. Reply clearly to: {}", message)
}
