pub mod collection_fetcher;
