//! Declarative condition -> message rules.
//!
//! Suggestions and recommendations are tables of [`Rule`]s evaluated in
//! order against a context value. Adding advice means adding a row.

/// One piece of advice: fires when `applies` holds, rendering `message`.
pub struct Rule<C> {
    pub name: &'static str,
    pub applies: fn(&C) -> bool,
    pub message: fn(&C) -> String,
}

impl<C> Rule<C> {
    pub fn new(name: &'static str, applies: fn(&C) -> bool, message: fn(&C) -> String) -> Self {
        Self {
            name,
            applies,
            message,
        }
    }
}

impl<C> std::fmt::Debug for Rule<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// Messages of every rule that applies, in table order.
pub fn apply_rules<C>(rules: &[Rule<C>], ctx: &C) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| (rule.applies)(ctx))
        .map(|rule| {
            tracing::trace!(rule = rule.name, "rule fired");
            (rule.message)(ctx)
        })
        .collect()
}

/// Append messages not already present, keeping first-seen order.
pub(crate) fn append_unique<I>(out: &mut Vec<String>, extra: I)
where
    I: IntoIterator<Item = String>,
{
    for message in extra {
        let message = message.trim();
        if message.is_empty() || out.iter().any(|m| m == message) {
            continue;
        }
        out.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_fire_in_table_order() {
        let rules: Vec<Rule<i32>> = vec![
            Rule::new("positive", |n: &i32| *n > 0, |n: &i32| format!("{n} is positive")),
            Rule::new("even", |n: &i32| n % 2 == 0, |n: &i32| format!("{n} is even")),
            Rule::new("big", |n: &i32| *n > 100, |_: &i32| "big".to_string()),
        ];
        assert_eq!(apply_rules(&rules, &4), vec!["4 is positive", "4 is even"]);
        assert_eq!(apply_rules(&rules, &-3), Vec::<String>::new());
    }

    #[test]
    fn test_append_unique_skips_duplicates_and_blanks() {
        let mut out = vec!["a".to_string()];
        append_unique(&mut out, ["a", " ", "b ", "b"].map(String::from));
        assert_eq!(out, vec!["a", "b"]);
    }
}
