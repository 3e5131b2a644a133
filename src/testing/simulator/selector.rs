//! Locator evaluation against the simulated UI tree
//!
//! Supports the UiSelector methods and XPath shapes the suite uses:
//! `className`, `description`, `descriptionContains`, `text`,
//! `textContains`, `resourceId`, `instance` and nested `childSelector`,
//! plus `//class[@attr="value"]`.

use crate::webdriver::{Locator, Rect, Strategy};

/// One element of the simulated UI hierarchy
#[derive(Debug, Clone)]
pub(super) struct Node {
    pub id: String,
    pub class: &'static str,
    pub desc: String,
    pub text: String,
    pub rect: Rect,
    pub parent: Option<usize>,
    pub clickable: bool,
}

#[derive(Debug, Default, PartialEq)]
pub(super) struct Selector {
    class_name: Option<String>,
    description: Option<String>,
    description_contains: Option<String>,
    text: Option<String>,
    text_contains: Option<String>,
    resource_id: Option<String>,
    instance: Option<usize>,
    child: Option<Box<Selector>>,
}

/// Translate any supported locator into a selector
pub(super) fn compile(locator: &Locator) -> Result<Selector, String> {
    let selector: &str = &locator.selector;
    match locator.strategy {
        Strategy::AndroidUiAutomator => Parser::new(selector).parse(),
        Strategy::Xpath => compile_xpath(selector),
        Strategy::AccessibilityId => Ok(Selector {
            description: Some(selector.to_string()),
            ..Default::default()
        }),
        Strategy::ClassName => Ok(Selector {
            class_name: Some(selector.to_string()),
            ..Default::default()
        }),
        Strategy::Id => Ok(Selector {
            resource_id: Some(selector.to_string()),
            ..Default::default()
        }),
    }
}

/// Indices of matching nodes in document order
pub(super) fn select(nodes: &[Node], selector: &Selector) -> Vec<usize> {
    select_within(nodes, selector, None)
}

fn select_within(nodes: &[Node], selector: &Selector, scope: Option<usize>) -> Vec<usize> {
    let mut found: Vec<usize> = (0..nodes.len())
        .filter(|&i| scope.is_none_or(|ancestor| is_descendant(nodes, i, ancestor)))
        .filter(|&i| matches(&nodes[i], selector))
        .collect();

    if let Some(n) = selector.instance {
        found = found.get(n).copied().into_iter().collect();
    }

    let Some(child) = &selector.child else {
        return found;
    };

    let mut children = Vec::new();
    for parent in found {
        for i in select_within(nodes, child, Some(parent)) {
            if !children.contains(&i) {
                children.push(i);
            }
        }
    }
    children
}

fn is_descendant(nodes: &[Node], index: usize, ancestor: usize) -> bool {
    let mut current = nodes[index].parent;
    while let Some(parent) = current {
        if parent == ancestor {
            return true;
        }
        current = nodes[parent].parent;
    }
    false
}

fn matches(node: &Node, selector: &Selector) -> bool {
    let exact = |want: &Option<String>, have: &str| want.as_deref().is_none_or(|w| w == have);
    let within = |want: &Option<String>, have: &str| want.as_deref().is_none_or(|w| have.contains(w));

    exact(&selector.class_name, node.class)
        && exact(&selector.description, &node.desc)
        && within(&selector.description_contains, &node.desc)
        && exact(&selector.text, &node.text)
        && within(&selector.text_contains, &node.text)
        && exact(&selector.resource_id, &node.id)
}

fn compile_xpath(expr: &str) -> Result<Selector, String> {
    let rest = expr
        .strip_prefix("//")
        .ok_or_else(|| format!("unsupported XPath '{expr}'"))?;
    let (class, predicate) = match rest.find('[') {
        Some(i) => (&rest[..i], Some(&rest[i..])),
        None => (rest, None),
    };

    let mut selector = Selector::default();
    if class.is_empty() {
        return Err(format!("unsupported XPath '{expr}'"));
    }
    if class != "*" {
        selector.class_name = Some(class.to_string());
    }

    if let Some(predicate) = predicate {
        let (attr, value) = predicate
            .strip_prefix("[@")
            .and_then(|p| p.strip_suffix(']'))
            .and_then(|p| p.split_once('='))
            .ok_or_else(|| format!("unsupported XPath predicate '{predicate}'"))?;
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .ok_or_else(|| format!("unquoted XPath value in '{predicate}'"))?
            .to_string();

        match attr.trim() {
            "content-desc" => selector.description = Some(value),
            "text" => selector.text = Some(value),
            "resource-id" => selector.resource_id = Some(value),
            other => return Err(format!("unsupported XPath attribute '{other}'")),
        }
    }

    Ok(selector)
}

/// Recursive-descent parser for UiSelector chains
struct Parser<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn new(src: &'s str) -> Self {
        Self { src, pos: 0 }
    }

    fn parse(mut self) -> Result<Selector, String> {
        let selector = self.selector()?;
        self.skip_ws();
        if self.pos != self.src.len() {
            return Err(self.error("trailing input"));
        }
        Ok(selector)
    }

    /// `new UiSelector().a(..).b(..)` or a bare `a(..).b(..)` chain
    fn selector(&mut self) -> Result<Selector, String> {
        let mut selector = Selector::default();
        self.skip_ws();

        if self.eat("new") {
            self.skip_ws();
            self.expect("UiSelector")?;
            self.expect("(")?;
            self.expect(")")?;
        } else {
            self.method(&mut selector)?;
        }

        loop {
            self.skip_ws();
            if !self.eat(".") {
                break;
            }
            self.method(&mut selector)?;
        }
        Ok(selector)
    }

    fn method(&mut self, selector: &mut Selector) -> Result<(), String> {
        self.skip_ws();
        let name = self.ident();
        self.expect("(")?;

        match name {
            "className" => selector.class_name = Some(self.string()?),
            "description" => selector.description = Some(self.string()?),
            "descriptionContains" => selector.description_contains = Some(self.string()?),
            "text" => selector.text = Some(self.string()?),
            "textContains" => selector.text_contains = Some(self.string()?),
            "resourceId" => selector.resource_id = Some(self.string()?),
            "instance" => selector.instance = Some(self.integer()?),
            "childSelector" => selector.child = Some(Box::new(self.selector()?)),
            "" => return Err(self.error("expected method name")),
            other => return Err(format!("unsupported UiSelector method '{other}'")),
        }

        self.expect(")")
    }

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), String> {
        self.skip_ws();
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{token}'")))
        }
    }

    fn ident(&mut self) -> &'s str {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn string(&mut self) -> Result<String, String> {
        self.skip_ws();
        if !self.eat("\"") {
            return Err(self.error("expected string literal"));
        }

        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(out);
                }
                '\\' => match chars.next() {
                    Some((_, escaped)) => out.push(escaped),
                    None => break,
                },
                c => out.push(c),
            }
        }
        Err(self.error("unterminated string literal"))
    }

    fn integer(&mut self) -> Result<usize, String> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let value = rest[..len]
            .parse()
            .map_err(|_| self.error("expected integer"))?;
        self.pos += len;
        Ok(value)
    }

    fn error(&self, message: &str) -> String {
        format!("{} at offset {} in '{}'", message, self.pos, self.src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, class: &'static str, desc: &str, parent: Option<usize>) -> Node {
        Node {
            id: id.to_string(),
            class,
            desc: desc.to_string(),
            text: String::new(),
            rect: Rect::default(),
            parent,
            clickable: false,
        }
    }

    fn ids(nodes: &[Node], locator: &Locator) -> Vec<String> {
        let selector = compile(locator).unwrap();
        select(nodes, &selector)
            .into_iter()
            .map(|i| nodes[i].id.clone())
            .collect()
    }

    fn tree() -> Vec<Node> {
        vec![
            node("root", "android.view.View", "", None),
            node("a", "android.widget.EditText", "", Some(0)),
            node("group", "android.view.View", "", Some(0)),
            node("b", "android.widget.EditText", "", Some(2)),
            node("c", "android.widget.EditText", "", Some(2)),
            node("save", "android.widget.Button", "Save", Some(0)),
            node("planted", "android.view.View", "Day planted\nNot set", Some(0)),
        ]
    }

    #[test]
    fn test_parse_chain() {
        let selector = Parser::new(r#"new UiSelector().className("x.Y").instance(3)"#)
            .parse()
            .unwrap();
        assert_eq!(selector.class_name.as_deref(), Some("x.Y"));
        assert_eq!(selector.instance, Some(3));
    }

    #[test]
    fn test_instance_counts_matches() {
        let nodes = tree();
        let locator =
            Locator::ui_automator(r#"new UiSelector().className("android.widget.EditText").instance(1)"#);
        assert_eq!(ids(&nodes, &locator), ["b"]);
    }

    #[test]
    fn test_child_selector_is_scoped() {
        let nodes = tree();
        let locator = Locator::ui_automator(
            r#"new UiSelector().className("android.view.View").instance(1).childSelector(className("android.widget.EditText").instance(1))"#,
        );
        assert_eq!(ids(&nodes, &locator), ["c"]);
    }

    #[test]
    fn test_description_contains_and_escapes() {
        let nodes = tree();
        assert_eq!(
            ids(&nodes, &Locator::description_contains("Day planted")),
            ["planted"]
        );
        assert!(ids(&nodes, &Locator::description_contains(r#"Say "hi""#)).is_empty());
    }

    #[test]
    fn test_xpath_subset() {
        let nodes = tree();
        let locator = Locator::xpath(r#"//android.widget.Button[@content-desc="Save"]"#);
        assert_eq!(ids(&nodes, &locator), ["save"]);
        assert_eq!(ids(&nodes, &Locator::xpath("//android.widget.EditText")).len(), 3);
        assert!(compile(&Locator::xpath("/hierarchy")).is_err());
    }

    #[test]
    fn test_malformed_selectors_rejected() {
        for bad in [
            r#"new UiSelector().description("Today""#,
            r#"new UiSelector().scrollable(true)"#,
            r#"new UiSelector().instance(x)"#,
            r#"new UiSelector() junk"#,
        ] {
            assert!(compile(&Locator::dynamic(Strategy::AndroidUiAutomator, bad.into())).is_err(), "{bad}");
        }
    }
}
