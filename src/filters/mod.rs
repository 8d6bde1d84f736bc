pub mod answer_cleaner;
