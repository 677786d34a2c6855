use ansi_term::{Color, Style};
use std::{borrow::Cow, collections::HashMap, fmt::Display};

pub const DEFAULT: Style = Style {
    foreground: None,
    background: None,
    is_bold: false,
    is_dimmed: false,
    is_italic: false,
    is_underline: false,
    is_blink: false,
    is_reverse: false,
    is_hidden: false,
    is_strikethrough: false,
};

lazy_static::lazy_static! {
    pub static ref STYLE_MAP: HashMap<String, Style> = {
        let entries = &[
            ("comment", StyleNode::Base(Color::Cyan.normal())),
            ("error", StyleNode::Base(Color::Red.bold())),
            ("extends", StyleNode::Base(Color::Yellow.bold())),
            ("attribute", StyleNode::Base(Color::Cyan.normal())),
            ("attribute.unknown", StyleNode::Inherit(Overrides::default().dimmed(true))),

            ("type", StyleNode::Base(Color::Green.normal())),
            ("type.object", StyleNode::Inherit(Overrides::default().bold(true))),
            ("type.descriptor", StyleNode::Inherit(Overrides::default())),

            ("pool.index", StyleNode::Base(Color::Cyan.bold())),

            ("pool.val", StyleNode::Base(Color::Green.bold())),
            ("pool.val.utf8", StyleNode::Base(DEFAULT)),
            ("pool.val.int", StyleNode::Inherit(Overrides::default())),
            ("pool.val.float", StyleNode::Inherit(Overrides::default())),
            ("pool.val.long", StyleNode::Inherit(Overrides::default())),
            ("pool.val.double", StyleNode::Inherit(Overrides::default())),

            ("pool.ref", StyleNode::Base(DEFAULT)),
            ("pool.ref.member", StyleNode::Base(Color::Yellow.bold())),
            ("pool.ref.member.field", StyleNode::Inherit(Overrides::default())),
            ("pool.ref.member.method", StyleNode::Inherit(Overrides::default())),
            ("pool.ref.member.interface_method", StyleNode::Inherit(Overrides::default())),
            ("pool.ref.string", StyleNode::Base(Color::Yellow.bold())),
            ("pool.ref.class", StyleNode::Base(Color::Yellow.bold())),
            ("pool.ref.module", StyleNode::Base(Color::Yellow.normal())),
            ("pool.ref.package", StyleNode::Base(Color::Yellow.normal())),
            ("pool.ref.name_and_type", StyleNode::Base(Color::Blue.bold())),
            ("pool.ref.dynamic", StyleNode::Base(Color::Purple.normal())),
            ("pool.ref.dynamic.method_type", StyleNode::Inherit(Overrides::default())),
            ("pool.ref.dynamic.method_handle", StyleNode::Inherit(Overrides::default())),
            ("pool.ref.dynamic.constant", StyleNode::Inherit(Overrides::default())),
            ("pool.ref.dynamic.invoke", StyleNode::Inherit(Overrides::default())),

            ("access", StyleNode::Base(Color::Yellow.normal())),
            ("access.class", StyleNode::Base(Color::Blue.bold())),
        ];

        let entries = entries.iter().map(|&(name, node)| (Cow::from(name), node)).collect::<HashMap<_, _>>();
        let mut resolved = HashMap::new();

        for path in entries.keys() {
            resolved.insert(path.clone().into(), compute_node(&entries, path).unwrap_or(DEFAULT));
        }

        resolved
    };
}

fn compute_node(ctx: &HashMap<Cow<'_, str>, StyleNode>, name: &str) -> Option<Style> {
    match *ctx.get(name)? {
        StyleNode::Base(style) => Some(style),
        StyleNode::Inherit(overrides) => {
            let (pos, _) = name.rmatch_indices('.').next()?;
            compute_node(ctx, &name[..pos]).map(|style| overrides.apply(style))
        }
    }
}

/// Looks up `path`, falling back to its closest styled ancestor.
pub fn style(path: &str) -> Style {
    let mut path = path;
    loop {
        if let Some(style) = STYLE_MAP.get(path) {
            return *style;
        }
        match path.rfind('.') {
            Some(pos) => path = &path[..pos],
            None => return DEFAULT,
        }
    }
}

/// Renders values in the style map, or plainly when colour is off.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Painter {
    pub color: bool,
}

impl Painter {
    pub const PLAIN: Painter = Painter { color: false };

    pub fn paint(self, path: &str, value: impl Display) -> String {
        if self.color {
            style(path).paint(value.to_string()).to_string()
        } else {
            value.to_string()
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Overrides {
    pub is_bold: Option<bool>,
    pub is_dimmed: Option<bool>,
}

impl Overrides {
    pub fn bold(self, bold: bool) -> Self {
        Overrides {
            is_bold: Some(bold),
            ..self
        }
    }

    pub fn dimmed(self, dimmed: bool) -> Self {
        Overrides {
            is_dimmed: Some(dimmed),
            ..self
        }
    }

    fn apply(self, style: Style) -> Style {
        Style {
            is_bold: self.is_bold.unwrap_or(style.is_bold),
            is_dimmed: self.is_dimmed.unwrap_or(style.is_dimmed),
            ..style
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum StyleNode {
    Base(Style),
    Inherit(Overrides),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_inherit_from_parent() {
        assert_eq!(style("type.object"), Color::Green.bold());
        assert_eq!(style("pool.val.long"), Color::Green.bold());
        assert_eq!(style("attribute.unknown"), Color::Cyan.normal().dimmed());
    }

    #[test]
    fn test_plain_painter_skips_escapes() {
        assert_eq!(Painter::PLAIN.paint("error", "MISMATCH"), "MISMATCH");
        assert_eq!(
            Painter { color: true }.paint("error", "MISMATCH"),
            Color::Red.bold().paint("MISMATCH").to_string()
        );
    }

    #[test]
    fn test_unlisted_paths_use_closest_ancestor() {
        assert_eq!(style("pool.ref.class.array"), Color::Yellow.bold());
        assert_eq!(style("nothing.here"), DEFAULT);
    }
}
