pub mod stockist_csv;
