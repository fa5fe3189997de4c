pub mod customer_fetcher;
