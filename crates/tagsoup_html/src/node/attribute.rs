use std::fmt;

/// A single entry in the attribute list of a tag.
///
/// Besides real attributes the list also holds the whitespace found between them, so a tag can
/// be written back exactly as it was read. The parts of an attribute map onto the source as
/// `name` `assignment` `quote` `value` `quote`, where the assignment is the `=` together with
/// any whitespace around it.
///
/// | form       | name | assignment | value          |
/// |------------|------|------------|----------------|
/// | whitespace | no   | no         | the whitespace |
/// | standalone | yes  | no         | no             |
/// | empty      | yes  | yes        | no             |
/// | valued     | yes  | yes        | yes            |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    name: Option<String>,
    assignment: Option<String>,
    value: Option<String>,
    quote: Option<char>,
}

impl Attribute {
    /// Creates a valued attribute `name="value"`
    pub fn new(name: &str, value: &str, quote: Option<char>) -> Self {
        Self::valued(name.to_string(), "=".to_string(), value.to_string(), quote)
    }

    pub(crate) fn valued(name: String, assignment: String, value: String, quote: Option<char>) -> Self {
        Self {
            name: Some(name),
            assignment: Some(assignment),
            value: Some(value),
            quote,
        }
    }

    /// Creates an attribute without a value, like `disabled`
    pub fn standalone(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            assignment: None,
            value: None,
            quote: None,
        }
    }

    /// Creates an attribute with an assignment but nothing assigned, like `alt=`
    pub fn empty(name: &str, assignment: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            assignment: Some(assignment.to_string()),
            value: None,
            quote: None,
        }
    }

    /// Creates a whitespace entry
    pub fn whitespace(text: &str) -> Self {
        Self {
            name: None,
            assignment: None,
            value: Some(text.to_string()),
            quote: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    pub fn assignment(&self) -> Option<&str> {
        self.assignment.as_deref()
    }

    pub fn set_assignment(&mut self, assignment: Option<&str>) {
        self.assignment = assignment.map(str::to_string);
    }

    /// Value without quotes. For whitespace entries this is the whitespace itself.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: &str) {
        self.value = Some(value.to_string());
    }

    pub fn quote(&self) -> Option<char> {
        self.quote
    }

    pub fn set_quote(&mut self, quote: Option<char>) {
        self.quote = quote;
    }

    /// Value including its quotes
    pub fn raw_value(&self) -> Option<String> {
        let value = self.value.as_deref()?;
        Some(match self.quote {
            Some(q) => format!("{q}{value}{q}"),
            None => value.to_string(),
        })
    }

    pub fn is_whitespace(&self) -> bool {
        self.name.is_none()
    }

    pub fn is_standalone(&self) -> bool {
        self.name.is_some() && self.assignment.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_some() && self.assignment.is_some() && self.value.is_none()
    }

    pub fn is_valued(&self) -> bool {
        self.name.is_some() && self.value.is_some()
    }

    /// Returns true when the attribute is named `name`, ignoring case
    pub fn has_name(&self, name: &str) -> bool {
        self.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name))
    }

    /// Number of characters the attribute takes up in the source
    pub fn length(&self) -> usize {
        let mut len = 0;
        if let Some(name) = &self.name {
            len += name.chars().count();
        }
        if let Some(assignment) = &self.assignment {
            len += assignment.chars().count();
        }
        if let Some(value) = &self.value {
            len += value.chars().count();
        }
        if self.quote.is_some() {
            len += 2;
        }
        len
    }

    /// Writes the attribute. Generated output quotes an unquoted value that could not be read
    /// back unquoted, like the remains of an unterminated quote.
    pub(crate) fn write_html(&self, buf: &mut String, verbatim: bool) {
        if let Some(name) = &self.name {
            buf.push_str(name);
        }
        if let Some(assignment) = &self.assignment {
            buf.push_str(assignment);
        }
        if let Some(value) = &self.value {
            if !verbatim && self.name.is_some() && self.quote.is_none() && !quote_fits(None, value) {
                let (quote, value) = choose_quote(value);
                let q = quote.unwrap_or('"');
                buf.push(q);
                buf.push_str(&value);
                buf.push(q);
                return;
            }
            if let Some(q) = self.quote {
                buf.push(q);
            }
            buf.push_str(value);
            if let Some(q) = self.quote {
                buf.push(q);
            }
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = String::new();
        self.write_html(&mut buf, true);
        write!(f, "{buf}")
    }
}

/// Picks the quote for a new value: double quotes unless the value contains them, single quotes
/// unless it contains those too, in which case double quotes are escaped.
pub(crate) fn choose_quote(value: &str) -> (Option<char>, String) {
    if !value.contains('"') {
        (Some('"'), value.to_string())
    } else if !value.contains('\'') {
        (Some('\''), value.to_string())
    } else {
        (Some('"'), value.replace('"', "&quot;"))
    }
}

/// Returns true when the value can be written with the given quote
pub(crate) fn quote_fits(quote: Option<char>, value: &str) -> bool {
    match quote {
        Some(q) => !value.contains(q),
        None => {
            !value.is_empty()
                && !value
                    .chars()
                    .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '>' | '<' | '='))
        }
    }
}
