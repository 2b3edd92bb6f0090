pub mod kestrel;
