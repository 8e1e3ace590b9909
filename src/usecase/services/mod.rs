pub mod paged_query_service;
