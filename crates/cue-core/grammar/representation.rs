//! TTML structural grammar
//!
//! Each element the walker understands has a static [`NodeRepresentation`]
//! naming its allowed children as an ordered [`Rule`] list. Child lists are
//! built on demand through a function pointer, which lets recursive
//! elements (`span` inside `span`, `div` inside `div`) refer to each other
//! without building an infinite structure.
//!
//! ```text
//! tt      : head?, body?
//! head    : metadata*, styling?, layout?
//! styling : metadata*, style*
//! layout  : metadata*, region*
//! region  : metadata*, animation*, style*
//! body    : metadata*, animation*, region?, div+
//! div     : metadata*, animation*, region?, (div | p)*
//! p       : metadata*, animation*, region?, (span | br)*
//! span    : metadata*, animation*, region?, (span | br)*
//! ```

use super::kleene::{one_or_more, or, zero_or_more, zero_or_one, Rule, RuleSequence};

/// Static description of one element kind
#[derive(Debug)]
pub struct NodeRepresentation {
    /// Local element name
    pub name: &'static str,
    /// Whether character data is allowed directly inside
    pub accepts_text: bool,
    children: fn() -> Vec<Rule>,
}

impl NodeRepresentation {
    /// Check if this representation describes `name`
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.name == name
    }

    /// Fresh (unmatched) rule list for this element's children
    #[must_use]
    pub fn child_rules(&self) -> Vec<Rule> {
        (self.children)()
    }

    /// Fresh cursor over this element's children
    #[must_use]
    pub fn child_sequence(&self) -> RuleSequence {
        RuleSequence::new(self.child_rules())
    }
}

fn no_children() -> Vec<Rule> {
    Vec::new()
}

/// `<tt>`, the document root
pub static TT: NodeRepresentation = NodeRepresentation {
    name: "tt",
    accepts_text: false,
    children: tt_children,
};

/// `<head>`
pub static HEAD: NodeRepresentation = NodeRepresentation {
    name: "head",
    accepts_text: false,
    children: head_children,
};

/// `<styling>`
pub static STYLING: NodeRepresentation = NodeRepresentation {
    name: "styling",
    accepts_text: false,
    children: styling_children,
};

/// `<style>`
pub static STYLE: NodeRepresentation = NodeRepresentation {
    name: "style",
    accepts_text: false,
    children: style_children,
};

/// `<layout>`
pub static LAYOUT: NodeRepresentation = NodeRepresentation {
    name: "layout",
    accepts_text: false,
    children: layout_children,
};

/// `<region>`, out-of-line inside `<layout>` or inline in content
pub static REGION: NodeRepresentation = NodeRepresentation {
    name: "region",
    accepts_text: false,
    children: region_children,
};

/// `<body>`
pub static BODY: NodeRepresentation = NodeRepresentation {
    name: "body",
    accepts_text: false,
    children: body_children,
};

/// `<div>`
pub static DIV: NodeRepresentation = NodeRepresentation {
    name: "div",
    accepts_text: false,
    children: div_children,
};

/// `<p>`
pub static P: NodeRepresentation = NodeRepresentation {
    name: "p",
    accepts_text: true,
    children: inline_children,
};

/// `<span>`
pub static SPAN: NodeRepresentation = NodeRepresentation {
    name: "span",
    accepts_text: true,
    children: inline_children,
};

/// `<br>`
pub static BR: NodeRepresentation = NodeRepresentation {
    name: "br",
    accepts_text: false,
    children: br_children,
};

/// `<metadata>` and every foreign-vocabulary element; content is skipped
pub static METADATA: NodeRepresentation = NodeRepresentation {
    name: "metadata",
    accepts_text: true,
    children: no_children,
};

/// `<set>`
pub static SET: NodeRepresentation = NodeRepresentation {
    name: "set",
    accepts_text: false,
    children: no_children,
};

/// `<animate>`
pub static ANIMATE: NodeRepresentation = NodeRepresentation {
    name: "animate",
    accepts_text: false,
    children: no_children,
};

fn tt_children() -> Vec<Rule> {
    vec![zero_or_one(&HEAD), zero_or_one(&BODY)]
}

fn head_children() -> Vec<Rule> {
    vec![
        zero_or_more(&METADATA),
        zero_or_one(&STYLING),
        zero_or_one(&LAYOUT),
    ]
}

fn styling_children() -> Vec<Rule> {
    vec![zero_or_more(&METADATA), zero_or_more(&STYLE)]
}

fn style_children() -> Vec<Rule> {
    vec![zero_or_more(&METADATA)]
}

fn layout_children() -> Vec<Rule> {
    vec![zero_or_more(&METADATA), zero_or_more(&REGION)]
}

fn region_children() -> Vec<Rule> {
    vec![
        zero_or_more(&METADATA),
        zero_or_more(or([&SET, &ANIMATE])),
        zero_or_more(&STYLE),
    ]
}

fn body_children() -> Vec<Rule> {
    vec![
        zero_or_more(&METADATA),
        zero_or_more(or([&SET, &ANIMATE])),
        zero_or_one(&REGION),
        one_or_more(&DIV),
    ]
}

fn div_children() -> Vec<Rule> {
    vec![
        zero_or_more(&METADATA),
        zero_or_more(or([&SET, &ANIMATE])),
        zero_or_one(&REGION),
        zero_or_more(or([&DIV, &P])),
    ]
}

fn br_children() -> Vec<Rule> {
    vec![zero_or_more(&METADATA), zero_or_more(or([&SET, &ANIMATE]))]
}

fn inline_children() -> Vec<Rule> {
    vec![
        zero_or_more(&METADATA),
        zero_or_more(or([&SET, &ANIMATE])),
        zero_or_one(&REGION),
        zero_or_more(or([&SPAN, &BR])),
    ]
}

/// Name the grammar knows an element by
///
/// Elements of the TTML vocabulary (unprefixed or `tt:`) use their local
/// name; any other prefix (`ttm:`, `smpte:`, vendor extensions) is treated
/// as metadata.
#[must_use]
pub fn grammar_name(qualified: &str) -> &str {
    match qualified.split_once(':') {
        None => qualified,
        Some(("tt", local)) => local,
        Some(_) => METADATA.name,
    }
}
