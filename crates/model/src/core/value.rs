use serde::{Deserialize, Serialize};
use std::fmt;

/// Literals a spreadsheet application writes in place of a failed formula.
pub const ERROR_LITERALS: [&str; 7] = [
    "#N/A", "#REF!", "#VALUE!", "#DIV/0!", "#NAME?", "#NULL!", "#NUM!",
];

/// A single typed cell of a sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// A formula error such as `#N/A`.
    Error(String),
}

impl CellValue {
    /// Types a raw textual cell.
    ///
    /// Numbers and booleans are only recognised in their canonical spelling so
    /// that rendering the parsed value gives back the exact input text.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return CellValue::Empty;
        }

        match raw {
            "TRUE" => return CellValue::Bool(true),
            "FALSE" => return CellValue::Bool(false),
            _ => {}
        }

        if ERROR_LITERALS.contains(&raw) {
            return CellValue::Error(raw.to_string());
        }

        if let Ok(number) = raw.parse::<f64>()
            && number.is_finite()
            && number.to_string() == raw
        {
            return CellValue::Number(number);
        }

        CellValue::Text(raw.to_string())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// Textual form used when the sheet is written back out.
    pub fn render(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.clone(),
            CellValue::Number(number) => number.to_string(),
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
            CellValue::Error(literal) => literal.clone(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<bool> for CellValue {
    fn from(flag: bool) -> Self {
        CellValue::Bool(flag)
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        CellValue::Text(text.to_string())
    }
}

impl From<String> for CellValue {
    fn from(text: String) -> Self {
        CellValue::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_types_cells() {
        assert_eq!(CellValue::parse(""), CellValue::Empty);
        assert_eq!(CellValue::parse("TRUE"), CellValue::Bool(true));
        assert_eq!(CellValue::parse("FALSE"), CellValue::Bool(false));
        assert_eq!(CellValue::parse("42"), CellValue::Number(42.0));
        assert_eq!(CellValue::parse("3.5"), CellValue::Number(3.5));
        assert_eq!(CellValue::parse("#N/A"), CellValue::Error("#N/A".into()));
        assert_eq!(
            CellValue::parse("https://a.test"),
            CellValue::Text("https://a.test".into())
        );
    }

    #[test]
    fn test_parse_keeps_non_canonical_spellings_as_text() {
        assert_eq!(CellValue::parse("007"), CellValue::Text("007".into()));
        assert_eq!(CellValue::parse("true"), CellValue::Text("true".into()));
        assert_eq!(CellValue::parse("NaN"), CellValue::Text("NaN".into()));
        assert_eq!(CellValue::parse("inf"), CellValue::Text("inf".into()));
    }

    #[test]
    fn test_render_is_lossless_for_parsed_input() {
        for raw in ["", "TRUE", "12", "-0.25", "#REF!", " padded ", "007", "text"] {
            assert_eq!(CellValue::parse(raw).render(), raw);
        }
    }
}
