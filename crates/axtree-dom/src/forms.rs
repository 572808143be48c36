//! Form control accessors.
//!
//! The snapshot has no live form state: the `value` and `checked`
//! attributes stand in for the current value and checkedness.

use crate::Node;

/// Input element type, normalised the way browsers reflect `input.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputType {
    #[default]
    Text,
    Password,
    Email,
    Url,
    Tel,
    Number,
    Search,
    Hidden,
    Submit,
    Button,
    Reset,
    Checkbox,
    Radio,
    File,
    Image,
    Color,
    Date,
    DatetimeLocal,
    Month,
    Week,
    Time,
    Range,
}

impl InputType {
    /// Parse input type from string (case-insensitive, unknown -> text).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "password" => InputType::Password,
            "email" => InputType::Email,
            "url" => InputType::Url,
            "tel" => InputType::Tel,
            "number" => InputType::Number,
            "search" => InputType::Search,
            "hidden" => InputType::Hidden,
            "submit" => InputType::Submit,
            "button" => InputType::Button,
            "reset" => InputType::Reset,
            "checkbox" => InputType::Checkbox,
            "radio" => InputType::Radio,
            "file" => InputType::File,
            "image" => InputType::Image,
            "color" => InputType::Color,
            "date" => InputType::Date,
            "datetime-local" => InputType::DatetimeLocal,
            "month" => InputType::Month,
            "week" => InputType::Week,
            "time" => InputType::Time,
            "range" => InputType::Range,
            _ => InputType::Text,
        }
    }

    /// Check if this is a button type.
    pub fn is_button(&self) -> bool {
        matches!(
            self,
            InputType::Submit | InputType::Button | InputType::Reset | InputType::Image
        )
    }
}

impl Node {
    /// Normalised `type` of an `<input>`; `None` for other elements.
    pub fn input_type(&self) -> Option<InputType> {
        self.is_tag("input")
            .then(|| InputType::from_str(self.attribute_or_empty("type")))
    }

    /// Current value of a form control: the `value` attribute of an
    /// `<input>`, the text of a `<textarea>`. `None` for other elements.
    pub fn form_value(&self) -> Option<String> {
        if self.is_tag("input") {
            return Some(self.attribute_or_empty("value").to_string());
        }
        if self.is_tag("textarea") {
            return Some(self.text_content());
        }
        None
    }

    /// Checkedness of an `<input>`, seeded from its `checked` attribute.
    pub fn checked(&self) -> bool {
        self.is_tag("input") && self.has_attribute("checked")
    }

    /// The `placeholder` attribute, if present.
    pub fn placeholder(&self) -> Option<&str> {
        self.get_attribute("placeholder")
    }
}
