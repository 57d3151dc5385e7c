//=========================================================================
// Render Backend
//=========================================================================
//
// Contract with the external drawing collaborator.
//
// The core never rasterises anything. Once per frame it walks the active
// scene's entities in draw order and hands each one to the backend:
//
//   begin_frame() → draw(id, entity)* → present()
//
// `HeadlessBackend` records what it was asked to draw and is what the
// engine uses when no backend is configured.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

//=== Internal Dependencies ===============================================

use crate::core::entity::{Entity, EntityId, Visual};

//=== RenderBackend =======================================================

/// Drawing collaborator driven by the scheduler.
pub trait RenderBackend {
    /// Pixel size of a visual source, if it has one.
    ///
    /// Used to size textured entities at spawn time.
    fn texture_size(&mut self, visual: &Visual) -> Option<(u32, u32)>;

    /// The window was resized.
    fn resize(&mut self, _width: u32, _height: u32) {}

    /// The window title changed.
    fn set_title(&mut self, _title: &str) {}

    fn begin_frame(&mut self);

    fn draw(&mut self, id: EntityId, entity: &Entity);

    fn present(&mut self);
}

//=== FrameLog ============================================================

/// What a [`HeadlessBackend`] observed.
#[derive(Debug, Clone, Default)]
pub struct FrameLog {
    /// Frames presented so far.
    pub frames: u64,

    /// Entities drawn in the last presented frame, in draw order.
    pub last_frame: Vec<EntityId>,

    /// Latest title pushed by the core.
    pub title: Option<String>,

    /// Latest size pushed by the core.
    pub size: Option<(u32, u32)>,

    pending: Vec<EntityId>,
}

//=== HeadlessBackend =====================================================

/// Backend that draws nothing and records everything.
///
/// Clones share one [`FrameLog`]; keep a clone to inspect what the engine
/// drew after handing the other to the builder.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBackend {
    textures: HashMap<String, (u32, u32)>,
    log: Rc<RefCell<FrameLog>>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the pixel size reported for a texture path.
    pub fn with_texture(mut self, path: impl Into<String>, width: u32, height: u32) -> Self {
        self.textures.insert(path.into(), (width, height));
        self
    }

    /// Snapshot of the shared log.
    pub fn log(&self) -> FrameLog {
        self.log.borrow().clone()
    }
}

impl RenderBackend for HeadlessBackend {
    fn texture_size(&mut self, visual: &Visual) -> Option<(u32, u32)> {
        match visual {
            Visual::Texture(path) => self.textures.get(path).copied(),
            _ => None,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.log.borrow_mut().size = Some((width, height));
    }

    fn set_title(&mut self, title: &str) {
        self.log.borrow_mut().title = Some(title.to_owned());
    }

    fn begin_frame(&mut self) {
        self.log.borrow_mut().pending.clear();
    }

    fn draw(&mut self, id: EntityId, _entity: &Entity) {
        self.log.borrow_mut().pending.push(id);
    }

    fn present(&mut self) {
        let mut log = self.log.borrow_mut();
        log.last_frame = std::mem::take(&mut log.pending);
        log.frames += 1;
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
