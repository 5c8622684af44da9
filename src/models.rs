pub mod audit;
pub mod auth;
pub mod customer;
pub mod location;
pub mod notification;
pub mod proposal;
pub mod sla;
pub mod third_party;
pub mod work_order;
