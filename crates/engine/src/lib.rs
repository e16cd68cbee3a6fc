pub mod adapters;
pub mod clock;
pub mod controller;
pub mod debounce;
pub mod decision;
pub mod events;
pub mod host;
pub mod insert;
pub mod issuer;
pub mod memory;
pub mod template;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{AutoExpansionController, PumpReport};
pub use decision::{decide, ExpansionDecision};
pub use events::{EventHub, HostEvent, ScrollMetrics, Subscription, Topic};
pub use host::{HostError, HostGridFacade, ViewportProvider};
pub use insert::{layout, FlowError, FlowStage, InsertFlow, InsertMode, InsertOutcome};
pub use issuer::MutationIssuer;
pub use memory::{MemoryHost, MemoryViewport};
pub use template::{LoadedDocument, TemplateError, TemplateLoader};
