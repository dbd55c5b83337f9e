//! Static income-tax fact table
//!
//! Thirteen question/answer pairs covering Indian income-tax slabs and regimes
//! for FY 2024-25 and FY 2025-26.

use serde::{Deserialize, Serialize};

/// A question paired with its canonical answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactPair {
    pub question: String,
    pub answer: String,
}

impl FactPair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// The text that gets embedded for this fact.
    ///
    /// The layout is load-bearing: changing it changes every stored vector.
    pub fn context(&self) -> String {
        format!("Question: {}\nAnswer: {}", self.question, self.answer)
    }
}

const TAX_FACTS: &[(&str, &str)] = &[
    (
        "What are the income tax slabs under the new tax regime for FY 2025-26 (AY 2026-27)?",
        "Rs 0- Rs 4 lakh: Nil, Rs 4 lakh - Rs 8 lakh: 5%, Rs 8 lakh - Rs 12 lakh: 10%, Rs 12 lakh - Rs 16 lakh: 15%, Rs 16 lakh - Rs 20 lakh: 20%, Rs 20 lakh - Rs 24 lakh: 25%, Above Rs 24 lakh: 30%",
    ),
    (
        "What are the income tax slabs under the new tax regime for FY 2024-25 (AY 2025-26)?",
        "Rs 0 - Rs 3 lakh: Nil, Rs 3 lakh - Rs 7 lakh: 5%, Rs 7 lakh - Rs 10 lakh: 10%, Rs 10 lakh - Rs 12 lakh: 15%, Rs 12 lakh - Rs 15 lakh: 20%, Above Rs 15 lakh: 30%",
    ),
    (
        "What are the changes in the new tax regime in Budget 2025?",
        "The basic exemption limit increased to Rs 4 lakh from Rs 3 lakh. Tax rebate under Section 87A now applies to taxable incomes up to Rs 12 lakh, making tax payable zero for income up to this limit.",
    ),
    (
        "What is the highest tax rate under the new tax regime?",
        "30% for income above Rs 24 lakh.",
    ),
    (
        "What is the highest surcharge rate in the new tax regime?",
        "25% for those earning above Rs 2 crore.",
    ),
    (
        "What is the standard deduction under the new tax regime?",
        "Rs 75,000 for salaried individuals and Rs 25,000 for family pensioners.",
    ),
    (
        "What are the tax slabs under the old tax regime for individuals below 60 years?",
        "Rs 0 - Rs 2.5 lakh: Nil, Rs 2.5 lakh - Rs 5 lakh: 5%, Rs 5 lakh - Rs 10 lakh: 20%, Above Rs 10 lakh: 30%",
    ),
    (
        "What are the tax slabs under the old tax regime for senior citizens (60-80 years)?",
        "Rs 0 - Rs 3 lakh: Nil, Rs 3 lakh - Rs 5 lakh: 5%, Rs 5 lakh - Rs 10 lakh: 20%, Above Rs 10 lakh: 30%",
    ),
    (
        "What are the tax slabs under the old tax regime for super senior citizens (80+ years)?",
        "Rs 0 - Rs 5 lakh: Nil, Rs 5 lakh - Rs 10 lakh: 20%, Above Rs 10 lakh: 30%",
    ),
    (
        "What is the tax rebate under Section 87A for FY 2025-26?",
        "Applicable for taxable incomes up to Rs 12 lakh, making tax payable zero up to this limit.",
    ),
    (
        "What is the standard deduction for employer's NPS contribution?",
        "14% from FY 2025-26, previously 10%.",
    ),
    (
        "Is the new tax regime mandatory?",
        "No, the new tax regime is the default, but individuals can opt for the old tax regime.",
    ),
    (
        "How does one choose between the new and old tax regimes?",
        "Individuals with deductions and exemptions (e.g., HRA, 80C, 80D) may find the old tax regime beneficial, while those with fewer deductions may prefer the new regime.",
    ),
];

/// The built-in income-tax fact table, in a stable order
pub fn tax_facts() -> Vec<FactPair> {
    TAX_FACTS
        .iter()
        .map(|(question, answer)| FactPair::new(*question, *answer))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_facts_size() {
        assert_eq!(tax_facts().len(), 13);
    }

    #[test]
    fn test_context_format() {
        let pair = FactPair::new("Q?", "A.");
        assert_eq!(pair.context(), "Question: Q?\nAnswer: A.");
    }

    #[test]
    fn test_questions_unique() {
        let facts = tax_facts();
        let mut questions: Vec<_> = facts.iter().map(|f| f.question.as_str()).collect();
        questions.sort_unstable();
        questions.dedup();
        assert_eq!(questions.len(), facts.len());
    }
}
