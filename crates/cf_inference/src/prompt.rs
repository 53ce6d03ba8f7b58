use cf_core::truncate_chars;

pub const DEFAULT_CHAR_LIMIT: usize = 3000;

/// The fixed instructions sent to the generative backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    /// Writer role: restyle the scraped chapter.
    Rewrite,
    /// Reviewer role: critique the rewritten chapter.
    Review,
}

impl PromptTemplate {
    pub fn instruction(&self) -> &'static str {
        match self {
            PromptTemplate::Rewrite => {
                "Rewrite the following chapter in a new style, preserving the meaning and structure:"
            }
            PromptTemplate::Review => {
                "Review the following rewritten chapter and provide suggestions for improvement:"
            }
        }
    }

    /// Embed at most the first `char_limit` characters of `text` after the instruction.
    pub fn render(&self, text: &str, char_limit: usize) -> String {
        format!("{}\n\n{}", self.instruction(), truncate_chars(text, char_limit))
    }
}
