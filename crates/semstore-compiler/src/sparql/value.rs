use super::builder::SparqlConditionBuilder;
use super::condition::{SparqlCondition, SparqlKind};
use super::term::{like_pattern_to_regex, string_literal};
use semstore_query::{Comparator, DataItem, Description, PropertyRef, ValueDescription, ValueKind};

impl SparqlConditionBuilder<'_> {
    pub(super) fn value_condition(
        &mut self,
        value: &ValueDescription,
        description: &Description,
        join_variable: &str,
        order_by: Option<&PropertyRef>,
    ) -> SparqlCondition {
        match value.comparator {
            Comparator::Eq => {
                let (term, prefix) = self.vocabulary.data_item(&value.value);
                let mut condition = SparqlCondition::new_singleton(term, "", false);
                if let Some(prefix) = prefix {
                    self.declare(&mut condition, prefix);
                }
                self.add_order_by_data_for_property(&mut condition, join_variable, order_by, Some(value.value.kind()));
                condition
            }
            Comparator::Like | Comparator::NotLike => {
                self.regex_condition(value, description, join_variable, order_by)
            }
            Comparator::Lt => self.comparison_condition(&value.value, "<", join_variable),
            Comparator::Gt => self.comparison_condition(&value.value, ">", join_variable),
            Comparator::Leq => self.comparison_condition(&value.value, "<=", join_variable),
            Comparator::Geq => self.comparison_condition(&value.value, ">=", join_variable),
            Comparator::Neq => self.comparison_condition(&value.value, "!=", join_variable),
        }
    }

    /// Ordered comparison. Pages compare by sort key.
    fn comparison_condition(&self, value: &DataItem, operator: &str, join_variable: &str) -> SparqlCondition {
        let mut condition = SparqlCondition::new_filter(String::new());
        self.add_order_by_data(&mut condition, join_variable, value.kind());
        let order_variable = condition
            .order_by_variable
            .clone()
            .unwrap_or_else(|| join_variable.to_string());
        let expr = match value {
            DataItem::Page(page) => {
                format!("str( ?{order_variable} ) {operator} {}", string_literal(&page.text()))
            }
            other => {
                let (term, prefix) = self.vocabulary.data_item(other);
                if let Some(prefix) = prefix {
                    self.declare(&mut condition, prefix);
                }
                format!("?{order_variable} {operator} {term}")
            }
        };
        condition.kind = SparqlKind::Filter { expr };
        condition
    }

    /// Wildcard match. Strings and URIs match directly, pages match on their
    /// sort key; other kinds cannot be matched and degrade to true.
    fn regex_condition(
        &mut self,
        value: &ValueDescription,
        description: &Description,
        join_variable: &str,
        order_by: Option<&PropertyRef>,
    ) -> SparqlCondition {
        let function = if value.comparator == Comparator::Like {
            "regex"
        } else {
            "!regex"
        };
        let mut condition = match &value.value {
            DataItem::Blob(text) => SparqlCondition::new_filter(format!(
                "{function}( ?{join_variable}, {}, \"s\" )",
                string_literal(&like_pattern_to_regex(text))
            )),
            DataItem::Uri(uri) => {
                let search = uri
                    .trim_start_matches("http://")
                    .trim_start_matches("https://")
                    .replace("%2A", "*");
                SparqlCondition::new_filter(format!(
                    "{function}( str( ?{join_variable} ), {}, \"i\" )",
                    string_literal(&like_pattern_to_regex(&search))
                ))
            }
            DataItem::Page(page) => {
                let sort_variable = self.next_variable();
                let mut condition = SparqlCondition::new_where(
                    format!(
                        "?{join_variable} swivt:wikiPageSortKey ?{sort_variable} .\nFILTER( {function}( ?{sort_variable}, {}, \"s\" ) )\n",
                        string_literal(&like_pattern_to_regex(&page.text()))
                    ),
                    true,
                );
                self.declare(&mut condition, "swivt");
                condition
            }
            DataItem::Number(_) | DataItem::Boolean(_) => {
                let message = format!(
                    "unsupported comparison for {} values: {}",
                    kind_name(value.value.kind()),
                    description.query_string(false)
                );
                tracing::warn!("{message}");
                self.errors.push(message);
                return self.new_true_condition(join_variable, order_by);
            }
        };
        self.add_order_by_data_for_property(&mut condition, join_variable, order_by, Some(value.value.kind()));
        condition
    }
}

fn kind_name(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Page => "page",
        ValueKind::Blob => "text",
        ValueKind::Number => "number",
        ValueKind::Boolean => "boolean",
        ValueKind::Uri => "URI",
    }
}
