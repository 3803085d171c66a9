//! Starter catalog.
//!
//! A handful of plain designs covering the field kinds a real catalog uses.
//! Production catalogs are supplied by the embedding application; these exist
//! for tests, demos and as a reference for writing designs.

use crate::design::BlockDesign;
use crate::registry::{Registry, RegistryBuilder, RegistryError};
use crate::render::RenderNode;
use crate::schema::{SchemaDescriptor, SchemaField};
use serde_json::{json, Value};
use sitecraft_model::{Block, EffectiveTheme, IdGenerator, ThemeToken};

/// Registry holding every starter design with its defaults
pub fn registry() -> Result<Registry, RegistryError> {
    register(Registry::builder()).build()
}

/// Add the starter designs and their type defaults to `builder`
pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .design(Hero::split())
        .design(Hero::centered())
        .design(TextBasic::new())
        .design(GalleryGrid::new())
        .default_design("hero", "hero-split")
        .default_design("text", "text-basic")
        .default_design("gallery", "gallery-grid")
}

fn section(block: &Block, theme: &EffectiveTheme) -> RenderNode {
    RenderNode::element("section")
        .with_attr("data-block-id", block.id.as_str())
        .with_style("background", theme.css(ThemeToken::SectionBackground))
        .with_style("color", theme.css(ThemeToken::BodyText))
}

fn heading(tag: &str, text: Option<&str>, theme: &EffectiveTheme) -> Option<RenderNode> {
    let text = text.filter(|t| !t.is_empty())?;
    Some(
        RenderNode::element(tag)
            .with_attr("data-path", "title")
            .with_style("color", theme.css(ThemeToken::TitleText))
            .with_child(RenderNode::text(text)),
    )
}

fn paragraph(path: &str, text: Option<&str>) -> Option<RenderNode> {
    let text = text.filter(|t| !t.is_empty())?;
    Some(
        RenderNode::element("p")
            .with_attr("data-path", path)
            .with_child(RenderNode::text(text)),
    )
}

#[derive(Debug, Clone, Copy)]
enum HeroLayout {
    Split,
    Centered,
}

pub struct Hero {
    layout: HeroLayout,
    schema: SchemaDescriptor,
}

impl Hero {
    fn new(layout: HeroLayout) -> Self {
        let mut content = vec![
            SchemaField::text("title", "Title"),
            SchemaField::multiline("subtitle", "Subtitle"),
            SchemaField::text("buttonLabel", "Button label"),
            SchemaField::text("buttonHref", "Button link"),
        ];
        if matches!(layout, HeroLayout::Split) {
            content.push(SchemaField::text("image", "Image URL"));
        }

        Self {
            layout,
            schema: SchemaDescriptor::new().section("Content", content).section(
                "Colors",
                vec![
                    SchemaField::color("colors.primary", "Button", Some("primary")),
                    SchemaField::color("colors.sectionBackground", "Background", Some("sectionBackground")),
                ],
            ),
        }
    }

    pub fn split() -> Self {
        Self::new(HeroLayout::Split)
    }

    pub fn centered() -> Self {
        Self::new(HeroLayout::Centered)
    }
}

impl BlockDesign for Hero {
    fn design_id(&self) -> &str {
        match self.layout {
            HeroLayout::Split => "hero-split",
            HeroLayout::Centered => "hero-centered",
        }
    }

    fn block_type(&self) -> &str {
        "hero"
    }

    fn label(&self) -> &str {
        match self.layout {
            HeroLayout::Split => "Hero with image",
            HeroLayout::Centered => "Centered hero",
        }
    }

    fn make_default(&self, ids: &mut dyn IdGenerator) -> Block {
        let block = Block::new(ids.next_id("hero"), "hero")
            .with_design(self.design_id())
            .with_field("title", json!("Welcome to our site"))
            .with_field("subtitle", json!("Tell visitors what you do in one sentence."))
            .with_field("buttonLabel", json!("Get in touch"))
            .with_field("buttonHref", json!("#contact"));

        match self.layout {
            HeroLayout::Split => block.with_field("image", json!("")),
            HeroLayout::Centered => block,
        }
    }

    fn render(&self, block: &Block, theme: &EffectiveTheme) -> RenderNode {
        let button = block.text("buttonLabel").filter(|l| !l.is_empty()).map(|label| {
            RenderNode::element("a")
                .with_attr("href", block.text("buttonHref").unwrap_or("#"))
                .with_attr("data-path", "buttonLabel")
                .with_style("background", theme.css(ThemeToken::Primary))
                .with_style("color", theme.css(ThemeToken::ButtonText))
                .with_style("border-radius", theme.css(ThemeToken::Radius))
                .with_child(RenderNode::text(label))
        });

        let copy = RenderNode::element("div")
            .with_optional_child(heading("h1", block.text("title"), theme))
            .with_optional_child(paragraph("subtitle", block.text("subtitle")))
            .with_optional_child(button);

        let root = section(block, theme).with_attr("data-layout", self.design_id());

        match self.layout {
            HeroLayout::Centered => root.with_style("text-align", Some("center")).with_child(copy),
            HeroLayout::Split => {
                let image = block.text("image").filter(|src| !src.is_empty()).map(|src| {
                    RenderNode::element("img")
                        .with_attr("src", src)
                        .with_style("border-radius", theme.css(ThemeToken::Radius))
                });
                root.with_child(copy).with_optional_child(image)
            }
        }
    }

    fn schema(&self) -> Option<&SchemaDescriptor> {
        Some(&self.schema)
    }
}

pub struct TextBasic {
    schema: SchemaDescriptor,
}

impl TextBasic {
    pub fn new() -> Self {
        Self {
            schema: SchemaDescriptor::new().section(
                "Content",
                vec![
                    SchemaField::text("heading", "Heading"),
                    SchemaField::multiline("body", "Body"),
                    SchemaField::select(
                        "align",
                        "Alignment",
                        &[("left", "Left"), ("center", "Center"), ("right", "Right")],
                    ),
                ],
            ),
        }
    }
}

impl Default for TextBasic {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDesign for TextBasic {
    fn design_id(&self) -> &str {
        "text-basic"
    }

    fn block_type(&self) -> &str {
        "text"
    }

    fn label(&self) -> &str {
        "Text"
    }

    fn make_default(&self, ids: &mut dyn IdGenerator) -> Block {
        Block::new(ids.next_id("text"), "text")
            .with_design("text-basic")
            .with_field("heading", json!("About us"))
            .with_field("body", json!("Write a few sentences about your business."))
            .with_field("align", json!("left"))
    }

    fn render(&self, block: &Block, theme: &EffectiveTheme) -> RenderNode {
        let heading = block
            .text("heading")
            .filter(|t| !t.is_empty())
            .map(|text| {
                RenderNode::element("h2")
                    .with_attr("data-path", "heading")
                    .with_style("color", theme.css(ThemeToken::TitleText))
                    .with_child(RenderNode::text(text))
            });

        section(block, theme)
            .with_style("text-align", block.text("align"))
            .with_optional_child(heading)
            .with_optional_child(paragraph("body", block.text("body")))
    }

    fn schema(&self) -> Option<&SchemaDescriptor> {
        Some(&self.schema)
    }
}

pub struct GalleryGrid {
    schema: SchemaDescriptor,
}

impl GalleryGrid {
    pub fn new() -> Self {
        Self {
            schema: SchemaDescriptor::new()
                .section(
                    "Content",
                    vec![
                        SchemaField::text("title", "Title"),
                        SchemaField::list(
                            "images",
                            "Images",
                            "Image",
                            vec![
                                SchemaField::text("src", "Image URL"),
                                SchemaField::text("caption", "Caption"),
                            ],
                            json!({ "src": "", "caption": "" }),
                        ),
                    ],
                )
                .section(
                    "Layout",
                    vec![
                        SchemaField::slider("columns", "Columns", 1.0, 6.0, 1.0),
                        SchemaField::boolean("showCaptions", "Show captions"),
                    ],
                ),
        }
    }
}

impl Default for GalleryGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDesign for GalleryGrid {
    fn design_id(&self) -> &str {
        "gallery-grid"
    }

    fn block_type(&self) -> &str {
        "gallery"
    }

    fn label(&self) -> &str {
        "Image grid"
    }

    fn make_default(&self, ids: &mut dyn IdGenerator) -> Block {
        Block::new(ids.next_id("gallery"), "gallery")
            .with_design("gallery-grid")
            .with_field("title", json!("Our work"))
            .with_field("images", json!([]))
            .with_field("columns", json!(3))
            .with_field("showCaptions", json!(true))
    }

    fn render(&self, block: &Block, theme: &EffectiveTheme) -> RenderNode {
        let columns = block
            .field("columns")
            .and_then(Value::as_u64)
            .unwrap_or(3)
            .clamp(1, 6);
        let show_captions = block
            .field("showCaptions")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        let images = block
            .field("images")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let grid = images
            .iter()
            .enumerate()
            .filter_map(|(index, image)| {
                let src = image.get("src").and_then(Value::as_str)?;
                let caption = image
                    .get("caption")
                    .and_then(Value::as_str)
                    .filter(|_| show_captions)
                    .filter(|c| !c.is_empty())
                    .map(|c| {
                        RenderNode::element("figcaption")
                            .with_attr("data-path", format!("images.{index}.caption"))
                            .with_child(RenderNode::text(c))
                    });

                Some(
                    RenderNode::element("figure")
                        .with_child(
                            RenderNode::element("img")
                                .with_attr("src", src)
                                .with_style("border-radius", theme.css(ThemeToken::Radius)),
                        )
                        .with_optional_child(caption),
                )
            })
            .fold(
                RenderNode::element("div")
                    .with_style("display", Some("grid"))
                    .with_style("grid-template-columns", Some(format!("repeat({columns}, 1fr)"))),
                RenderNode::with_child,
            );

        section(block, theme)
            .with_optional_child(heading("h2", block.text("title"), theme))
            .with_child(grid)
    }

    fn schema(&self) -> Option<&SchemaDescriptor> {
        Some(&self.schema)
    }
}
