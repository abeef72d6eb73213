//! Business logic services.
//!
//! Services turn fragment lists into graphs, hold the dialogue context, and
//! drive a chat session against a [`DialogueEndpoint`](crate::llm::DialogueEndpoint).

mod context;
mod dialogue;
mod dragdrop;
mod graph;
mod identity;
mod panel;
mod prompt;

pub use context::{ContextStore, ReconcileReport};
pub use dialogue::{
    DialogueMode, DialogueOrchestrator, DialogueSettings, DialogueState, PendingSend,
    SendOutcome, SendStatus,
};
pub use dragdrop::{
    DragPayload, DropZone, DroppedFragment, decode_drag_payload, encode_drag_payload,
};
pub use graph::{GraphBuilder, LayoutConfig};
pub use identity::{TEMP_ID_PREFIX, is_temporary, resolve_identity};
pub use panel::{PanelBounds, PanelController, PanelState, PointerEvent, drag, resize};
pub use prompt::{PREAMBLE_HEADER, PREAMBLE_INSTRUCTION, PromptBuilder, PromptContext};
