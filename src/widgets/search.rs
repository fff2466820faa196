use eframe::egui::{self, Response, Ui, Widget};

/// Single-line filter box with a clear button once text is present.
#[must_use = "You should put this widget in a ui with `ui.add(widget);`"]
pub struct SearchField<'a> {
    query: &'a mut String,
    hint: &'a str,
}

impl<'a> SearchField<'a> {
    pub fn new(query: &'a mut String) -> Self {
        Self {
            query,
            hint: "Zoeken...",
        }
    }

    pub fn hint(mut self, hint: &'a str) -> Self {
        self.hint = hint;
        self
    }
}

impl Widget for SearchField<'_> {
    fn ui(self, ui: &mut Ui) -> Response {
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(self.query)
                    .hint_text(self.hint)
                    .desired_width(ui.available_width() - 30.0),
            );
            if !self.query.is_empty() && ui.small_button("✕").clicked() {
                self.query.clear();
            }
            response
        })
        .inner
    }
}

/// Case-insensitive match over several haystacks, used by list filters.
pub fn matches_filter<'a>(query: &str, haystacks: impl IntoIterator<Item = &'a str>) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    haystacks
        .into_iter()
        .any(|h| h.to_lowercase().contains(&query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", true)]
    #[case("lant", true)]
    #[case("LANTAARN", true)]
    #[case("roestig", true)]
    #[case("sleutel", false)]
    fn filter_matches_any_field(#[case] query: &str, #[case] expected: bool) {
        let matched = matches_filter(query, ["Lantaarn", "Een roestige lantaarn", "item"]);
        assert_eq!(matched, expected);
    }
}
