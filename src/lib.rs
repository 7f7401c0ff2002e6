pub mod fake_feed;
pub mod feed;
pub mod http_client;
pub mod match_source;
pub mod model;
pub mod normalize;
pub mod state;
pub mod win_prob;
