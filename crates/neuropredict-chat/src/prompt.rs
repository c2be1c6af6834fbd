use neuropredict_core::ReadableInput;

const SYSTEM_CONTEXT: &str = "\
You are an assistant embedded in an Alzheimer's risk screening tool. \
Explain medical terms such as MMSE, ADL or BMI in plain, empathetic language. \
Never give a diagnosis. When asked for medical advice, recommend consulting a doctor.";

/// Assemble the full prompt for one user message, optionally grounded in the
/// patient data currently entered in the form.
pub fn build_prompt(message: &str, context: Option<&ReadableInput>) -> String {
    let mut prompt = String::from(SYSTEM_CONTEXT);

    if let Some(ctx) = context.filter(|c| !c.is_empty()) {
        prompt.push_str("\nCurrent patient data: ");
        let entries: Vec<String> = ctx
            .iter()
            .map(|f| format!("{}: {}", f.label, f.value))
            .collect();
        prompt.push_str(&entries.join(", "));
        prompt.push('.');
    }

    prompt.push_str("\nUser: ");
    prompt.push_str(message.trim());
    prompt
}
