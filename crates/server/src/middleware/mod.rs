pub mod request_id;

pub use request_id::create_request_id_layers;
