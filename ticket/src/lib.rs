pub mod service;
pub mod store;
pub mod ticket;

pub use service::{
    CREATE_FAILED_MESSAGE, CreateResult, LOOKUP_FAILED_MESSAGE, LookupResult, TicketService,
};
pub use store::{DynamoTicketStore, MemoryTicketStore, TicketError, TicketStore};
pub use ticket::{
    PENDING_STATUS, Ticket, TicketRequest, find_ticket_number, generate_ticket_number,
    is_valid_ticket_number,
};
