use crate::render::RenderNode;
use crate::schema::SchemaDescriptor;
use sitecraft_model::{Block, EffectiveTheme, IdGenerator};

/// One concrete block design in the catalog
///
/// Each design provides:
/// - A default factory for new blocks
/// - A renderer from block record + effective theme to a render tree
/// - An optional schema driving the generic form editor
///
/// `render` must degrade gracefully: missing or malformed fields drop the
/// corresponding output, they never panic.
pub trait BlockDesign: Send + Sync {
    /// Registry key stored in `Block::design_id`
    fn design_id(&self) -> &str;

    /// Category tag stored in `Block::block_type`
    fn block_type(&self) -> &str;

    /// Name shown in the block picker
    fn label(&self) -> &str;

    /// Build a complete default block, drawing ids from `ids`
    fn make_default(&self, ids: &mut dyn IdGenerator) -> Block;

    fn render(&self, block: &Block, theme: &EffectiveTheme) -> RenderNode;

    fn schema(&self) -> Option<&SchemaDescriptor> {
        None
    }
}
