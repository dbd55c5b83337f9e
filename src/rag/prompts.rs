// Prompt templates for the answer composer

/// Exact sentence the model is told to use when it cannot help
pub const APOLOGY: &str = "I'm sorry, I cannot answer that question.";

const PERSONA: &str = "You are an income tax expert.";

/// Ask the model to restate a retrieved fact for a lay reader
pub fn expand_prompt(query: &str, retrieved_answer: &str) -> String {
    format!(
        "{PERSONA} Provide a detailed and user-friendly response to the following question:\n\
         Question: {query}\n\
         Retrieved Answer: {retrieved_answer}\n\
         - Explain the answer in simple terms.\n\
         - Add context or examples if necessary.\n\
         - Ensure the response is grammatically correct and engaging.\n"
    )
}

/// Ask the model for a conversational reply to something the fact table does not cover
pub fn out_of_scope_prompt(query: &str) -> String {
    format!(
        "{PERSONA} Respond to the following question in a friendly and conversational tone:\n\
         Question: {query}\n\
         - If the question is outside your knowledge, respond with: \"{APOLOGY}\"\n"
    )
}
