/// Reply the model is told to give when the context does not cover the question.
pub const NOT_IN_CONTEXT: &str = "Information not available.";

/// Restricts the model to the retrieved context and ends on the answer marker,
/// so the continuation is the answer itself.
pub fn build_prompt(subject: &str, context: &str, query: &str) -> String {
    format!(
        "You are an intelligent assistant specialized in {subject} information.\n\
         Answer ONLY using the information provided in the (context).\n\
         If the information is not available, say: \"{NOT_IN_CONTEXT}\"\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question:\n\
         {query}\n\
         \n\
         Answer:",
        context = context.trim(),
        query = query.trim(),
    )
}

/// The `Context:` section of a prompt built by [`build_prompt`].
pub fn context_section(prompt: &str) -> Option<&str> {
    let start = prompt.find("Context:\n")? + "Context:\n".len();
    let end = prompt[start..].find("\n\nQuestion:\n")? + start;
    Some(&prompt[start..end])
}
