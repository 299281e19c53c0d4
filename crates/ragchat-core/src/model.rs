/// Model backends the server is known to understand.
///
/// Only used to offer choices in the UI; the `model-type` control is free text
/// and the backend decides what is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    Ollama,
    OpenAI,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Ollama => "ollama",
            ModelType::OpenAI => "openai",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Some(ModelType::Ollama),
            "openai" => Some(ModelType::OpenAI),
            _ => None,
        }
    }

    pub fn all() -> Vec<ModelType> {
        vec![ModelType::Ollama, ModelType::OpenAI]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelType::Ollama => "Ollama (Local)",
            ModelType::OpenAI => "OpenAI",
        }
    }

    /// The next known type after `current`, wrapping around. Unknown values
    /// start from the first entry.
    pub fn cycle(current: &str) -> ModelType {
        let all = Self::all();
        match Self::from_str(current).and_then(|t| all.iter().position(|x| *x == t)) {
            Some(idx) => all[(idx + 1) % all.len()],
            None => all[0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!(ModelType::from_str("Ollama"), Some(ModelType::Ollama));
        assert_eq!(ModelType::from_str(" OPENAI "), Some(ModelType::OpenAI));
        assert_eq!(ModelType::from_str("bogus"), None);
    }

    #[test]
    fn test_cycle_wraps() {
        assert_eq!(ModelType::cycle("ollama"), ModelType::OpenAI);
        assert_eq!(ModelType::cycle("openai"), ModelType::Ollama);
        assert_eq!(ModelType::cycle("custom"), ModelType::Ollama);
    }
}
