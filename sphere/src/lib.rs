pub use sphere_core::model::{PeerId, RoomId};

pub mod model {
    pub use sphere_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use sphere_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use sphere_client::*;
}
