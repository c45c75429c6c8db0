//! Prompt templates for the lease-analysis pipeline.

/// Separator placed between chunk analyses before global summarization.
pub const ANALYSIS_SEPARATOR: &str = "\n\n---\n\n";

/// Prompt asking for a structured analysis of one chunk. `index` is 0-based;
/// the prompt shows a 1-based part number.
pub fn chunk_analysis(chunk: &str, index: usize) -> String {
    format!(
        "Analyze this part of a rental agreement contract (Part {part}):\n\n\
         {chunk}\n\n\
         Please provide:\n\
         1. Key terms and conditions in this section\n\
         2. Important obligations or rights mentioned\n\
         3. Any potential issues or concerns\n\n\
         Format your response in bullet points.",
        part = index + 1,
    )
}

/// Prompt asking for the overall contract summary.
pub fn global_summary(combined_analyses: &str) -> String {
    format!(
        "Based on the following analyses of a rental agreement contract, provide a \
         comprehensive summary:\n\n\
         {combined_analyses}\n\n\
         Please provide:\n\
         1. Overall contract type and purpose\n\
         2. Key terms and conditions\n\
         3. Important obligations for both parties\n\
         4. Payment and deposit requirements\n\
         5. Duration and termination clauses",
    )
}

/// Prompt asking for the potential-issues review.
pub fn issue_review(combined_analyses: &str) -> String {
    format!(
        "Based on the following rental agreement analysis, identify potential problems \
         and issues:\n\n\
         {combined_analyses}\n\n\
         Please identify:\n\
         1. Unfair or one-sided clauses\n\
         2. Vague or ambiguous terms\n\
         3. Missing important protections\n\
         4. Potential legal compliance issues\n\
         5. Recommendations for improvement\n\n\
         Focus on issues that could cause problems for either party.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_prompt_uses_one_based_part_numbers() {
        let prompt = chunk_analysis("clause text", 0);
        assert!(prompt.contains("(Part 1)"));
        assert!(prompt.contains("clause text"));
    }

    #[test]
    fn global_prompts_embed_the_combined_analyses() {
        assert!(global_summary("joined analyses").contains("joined analyses"));
        assert!(issue_review("joined analyses").contains("joined analyses"));
    }
}
