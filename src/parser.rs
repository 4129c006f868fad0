use crate::models::{Segment, Template, TreeItem, Values, Variable};

/// Splits template content into literal runs and `{name}` placeholders.
///
/// A placeholder is `{`, one or more characters other than `}`, then `}`.
/// Anything that does not match (`{}`, a lone `{` or `}`) stays literal.
/// Empty literal runs are never emitted.
pub(crate) fn parse_segments(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;
    while let Some(open_rel) = content[cursor..].find('{') {
        let open = cursor + open_rel;
        let close = match content[open + 1..].find('}') {
            Some(close_rel) => open + 1 + close_rel,
            // no later `{` can close either
            None => break,
        };
        if close == open + 1 {
            cursor = open + 1;
            continue;
        }
        if open > literal_start {
            segments.push(Segment::Literal(content[literal_start..open].to_string()));
        }
        segments.push(Segment::Placeholder(content[open + 1..close].to_string()));
        cursor = close + 1;
        literal_start = cursor;
    }
    if literal_start < content.len() {
        segments.push(Segment::Literal(content[literal_start..].to_string()));
    }
    segments
}

/// Distinct placeholder names in order of first appearance.
pub(crate) fn placeholder_names(segments: &[Segment]) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for segment in segments {
        if let Segment::Placeholder(name) = segment {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
    }
    names
}

/// Replaces every `{name}` with its value. Missing or empty values become `""`.
///
/// Keys in `values` win over the parse boundaries: in `"a { b {name}"` the
/// stray `{` stays literal and `{name}` is still replaced. Values are copied
/// verbatim and never rescanned.
pub(crate) fn substitute(content: &str, values: &Values) -> String {
    let mut output = String::with_capacity(content.len());
    let mut cursor = 0;
    while let Some(open_rel) = content[cursor..].find('{') {
        let open = cursor + open_rel;
        output.push_str(&content[cursor..open]);
        let Some(close_rel) = content[open + 1..].find('}') else {
            cursor = open;
            break;
        };
        let close = open + 1 + close_rel;
        let name = &content[open + 1..close];
        if let Some(value) = values.get(name) {
            output.push_str(value);
            cursor = close + 1;
        } else if name.is_empty() || name.contains('{') {
            // a later `{` may still open a known name
            output.push('{');
            cursor = open + 1;
        } else {
            cursor = close + 1;
        }
    }
    output.push_str(&content[cursor..]);
    output
}

pub(crate) fn render_segments(segments: &[Segment], values: &Values) -> String {
    let mut output = String::new();
    for segment in segments {
        match segment {
            Segment::Literal(text) => output.push_str(text),
            Segment::Placeholder(name) => {
                let value = values.get(name).map(String::as_str).unwrap_or("");
                output.push_str(value);
            }
        }
    }
    output
}

/// Shows declared variables as `[label]`; undeclared placeholders stay as `{name}`.
pub(crate) fn label_preview(content: &str, declared: &[Variable]) -> String {
    let mut output = String::new();
    for segment in parse_segments(content) {
        match segment {
            Segment::Literal(text) => output.push_str(&text),
            Segment::Placeholder(name) => {
                match declared.iter().find(|variable| variable.name == name) {
                    Some(variable) => {
                        output.push('[');
                        output.push_str(variable.display_label());
                        output.push(']');
                    }
                    None => {
                        output.push('{');
                        output.push_str(&name);
                        output.push('}');
                    }
                }
            }
        }
    }
    output
}

/// Groups templates under their team, then by title.
pub(crate) fn build_tree_items<'a>(
    templates: &[Template],
    team_name: impl Fn(Option<u64>) -> &'a str,
) -> Vec<TreeItem> {
    let mut root = TreeNode::new("");
    for template in templates {
        let team = team_name(template.team_id);
        let title = template.title.trim();
        let title = if title.is_empty() {
            template.trigger.as_str()
        } else {
            title
        };
        root.insert(&[team, title], template.id);
    }

    let mut items = Vec::new();
    root.flatten(0, &mut items);
    items
}

#[derive(Clone, Debug)]
struct TreeNode {
    name: String,
    template_id: Option<u64>,
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            template_id: None,
            children: Vec::new(),
        }
    }

    fn insert(&mut self, parts: &[&str], template_id: u64) {
        let Some((part, rest)) = parts.split_first() else {
            self.template_id = Some(template_id);
            return;
        };
        // two templates sharing a title each get their own leaf
        let existing = self
            .children
            .iter_mut()
            .find(|child| child.name == *part && !(rest.is_empty() && child.template_id.is_some()));
        match existing {
            Some(node) => node.insert(rest, template_id),
            None => {
                let mut node = TreeNode::new(part);
                node.insert(rest, template_id);
                self.children.push(node);
            }
        }
    }

    fn flatten(&self, depth: usize, items: &mut Vec<TreeItem>) {
        for child in &self.children {
            items.push(TreeItem {
                label: child.name.clone(),
                depth,
                template_id: child.template_id,
            });
            child.flatten(depth + 1, items);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VariableType;

    /// Rebuilds the content a segment list was parsed from.
    fn to_source(segments: &[Segment]) -> String {
        let mut output = String::new();
        for segment in segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Placeholder(name) => {
                    output.push('{');
                    output.push_str(name);
                    output.push('}');
                }
            }
        }
        output
    }

    fn literal(text: &str) -> Segment {
        Segment::Literal(text.to_string())
    }

    fn placeholder(name: &str) -> Segment {
        Segment::Placeholder(name.to_string())
    }

    fn values(pairs: &[(&str, &str)]) -> Values {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn splits_literals_and_placeholders_in_order() {
        let segments = parse_segments("Hi {name}, your {code} is {code}");
        assert_eq!(
            segments,
            vec![
                literal("Hi "),
                placeholder("name"),
                literal(", your "),
                placeholder("code"),
                literal(" is "),
                placeholder("code"),
            ]
        );
    }

    #[test]
    fn empty_content_has_no_segments() {
        assert!(parse_segments("").is_empty());
    }

    #[test]
    fn literal_only_content_is_one_segment() {
        assert_eq!(
            parse_segments("no placeholders here"),
            vec![literal("no placeholders here")]
        );
    }

    #[test]
    fn adjacent_placeholders_emit_no_empty_literal() {
        assert_eq!(
            parse_segments("{a}{b}"),
            vec![placeholder("a"), placeholder("b")]
        );
    }

    #[test]
    fn empty_braces_stay_literal() {
        assert_eq!(parse_segments("{}"), vec![literal("{}")]);
        assert_eq!(
            parse_segments("a {} b {x}"),
            vec![literal("a {} b "), placeholder("x")]
        );
        assert_eq!(parse_segments("{}}"), vec![literal("{}}")]);
    }

    #[test]
    fn unbalanced_braces_stay_literal() {
        assert_eq!(parse_segments("open { only"), vec![literal("open { only")]);
        assert_eq!(parse_segments("close } only"), vec![literal("close } only")]);
        assert_eq!(
            parse_segments("} {x} {"),
            vec![literal("} "), placeholder("x"), literal(" {")]
        );
    }

    #[test]
    fn inner_open_brace_belongs_to_the_name() {
        assert_eq!(
            parse_segments("{{x}}"),
            vec![placeholder("{x"), literal("}")]
        );
        assert_eq!(parse_segments("{a{b}"), vec![placeholder("a{b")]);
    }

    #[test]
    fn multibyte_text_survives() {
        let content = "Olá {nome}, até já — {código}!";
        let segments = parse_segments(content);
        assert_eq!(segments[1], placeholder("nome"));
        assert_eq!(segments[3], placeholder("código"));
        assert_eq!(to_source(&segments), content);
    }

    #[test]
    fn round_trip_reconstructs_content() {
        let samples = [
            "",
            "plain",
            "{x}",
            "Hi {name}!",
            "{}{}{",
            "}{a}{",
            "{{x}}",
            "a{b{c}d}e",
            "line one\n{first}\n\tline {second} end",
            "{ spaced name }",
        ];
        for sample in samples {
            let segments = parse_segments(sample);
            assert_eq!(to_source(&segments), sample, "round trip of {sample:?}");
            assert!(
                segments
                    .iter()
                    .all(|segment| !matches!(segment, Segment::Literal(text) if text.is_empty())),
                "empty literal in {sample:?}"
            );
        }
    }

    #[test]
    fn parse_is_deterministic() {
        let content = "x {a} y {b}";
        assert_eq!(parse_segments(content), parse_segments(content));
    }

    #[test]
    fn distinct_names_collapse_duplicates() {
        let segments = parse_segments("Hi {name}, your {code} is {code}");
        assert_eq!(placeholder_names(&segments), vec!["name", "code"]);
    }

    #[test]
    fn substitutes_values() {
        assert_eq!(substitute("Hi {name}!", &values(&[("name", "Ana")])), "Hi Ana!");
    }

    #[test]
    fn missing_value_becomes_empty() {
        assert_eq!(substitute("Hi {name}!", &Values::new()), "Hi !");
        assert_eq!(substitute("Hi {name}!", &values(&[("name", "")])), "Hi !");
    }

    #[test]
    fn replaces_every_occurrence() {
        assert_eq!(substitute("{x}-{x}", &values(&[("x", "9")])), "9-9");
    }

    #[test]
    fn extra_values_are_ignored() {
        assert_eq!(
            substitute("Hi {name}!", &values(&[("name", "Ana"), ("other", "x")])),
            "Hi Ana!"
        );
    }

    #[test]
    fn literal_content_is_unchanged() {
        let content = "no placeholders here";
        assert_eq!(substitute(content, &values(&[("x", "1")])), content);
        assert_eq!(substitute("keep {} as is", &Values::new()), "keep {} as is");
    }

    #[test]
    fn substitution_is_idempotent_once_tokens_are_gone() {
        let once = substitute("Dear {name}, order {id}", &values(&[("name", "Ana"), ("id", "7")]));
        assert_eq!(once, "Dear Ana, order 7");
        assert_eq!(substitute(&once, &values(&[("name", "Bob")])), once);
    }

    #[test]
    fn values_are_inserted_verbatim() {
        assert_eq!(
            substitute("cost: {price}", &values(&[("price", "$1 & $&")])),
            "cost: $1 & $&"
        );
        assert_eq!(substitute("{a.b}", &values(&[("a.b", "dot")])), "dot");
    }

    #[test]
    fn known_name_inside_a_brace_run_is_replaced() {
        assert_eq!(
            substitute("Use { to open. Hi {name}", &values(&[("name", "Ana")])),
            "Use { to open. Hi Ana"
        );
        assert_eq!(substitute("{{x}}", &values(&[("x", "9")])), "{9}");
        assert_eq!(substitute("a {b {x} c", &values(&[("x", "1")])), "a {b 1 c");
    }

    #[test]
    fn stray_brace_before_missing_name_stays_literal() {
        assert_eq!(
            substitute("Use { to open. Hi {name}", &Values::new()),
            "Use { to open. Hi "
        );
        assert_eq!(substitute("tail {", &Values::new()), "tail {");
        assert_eq!(substitute("{}{x}", &values(&[("x", "1")])), "{}1");
    }

    #[test]
    fn bound_names_render_like_their_segments() {
        let samples = ["Hi {name}!", "{{x}}", "a{b{c}d}e", "{}{a}{", "Use { to open. Hi {name}"];
        for sample in samples {
            let segments = parse_segments(sample);
            let bound: Values = placeholder_names(&segments)
                .into_iter()
                .map(|name| (name.to_string(), format!("<{}>", name.len())))
                .collect();
            assert_eq!(
                substitute(sample, &bound),
                render_segments(&segments, &bound),
                "rendering of {sample:?}"
            );
        }
    }

    #[test]
    fn preview_uses_declared_labels() {
        let declared = vec![
            Variable {
                name: "client".to_string(),
                label: "Client name".to_string(),
                kind: VariableType::Text,
                required: true,
                options: Vec::new(),
            },
            Variable {
                name: "day".to_string(),
                ..Variable::default()
            },
        ];
        assert_eq!(
            label_preview("Hello {client}, see you {day} at {time}", &declared),
            "Hello [Client name], see you [day] at {time}"
        );
    }

    #[test]
    fn tree_groups_templates_by_team() {
        let templates = vec![
            Template {
                id: 1,
                title: "Welcome".to_string(),
                team_id: Some(7),
                ..Template::default()
            },
            Template {
                id: 2,
                title: "Signature".to_string(),
                ..Template::default()
            },
            Template {
                id: 3,
                title: "Follow up".to_string(),
                team_id: Some(7),
                ..Template::default()
            },
        ];
        let items = build_tree_items(&templates, |team| match team {
            Some(_) => "Sales",
            None => "Personal",
        });
        let labels: Vec<(&str, usize, Option<u64>)> = items
            .iter()
            .map(|item| (item.label.as_str(), item.depth, item.template_id))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("Sales", 0, None),
                ("Welcome", 1, Some(1)),
                ("Follow up", 1, Some(3)),
                ("Personal", 0, None),
                ("Signature", 1, Some(2)),
            ]
        );
    }

    #[test]
    fn tree_keeps_templates_with_the_same_title_apart() {
        let templates = vec![
            Template {
                id: 1,
                title: "Reply".to_string(),
                ..Template::default()
            },
            Template {
                id: 2,
                title: "Reply".to_string(),
                ..Template::default()
            },
        ];
        let items = build_tree_items(&templates, |_| "Personal");
        let ids: Vec<Option<u64>> = items.iter().map(|item| item.template_id).collect();
        assert_eq!(ids, vec![None, Some(1), Some(2)]);
    }
}
