//! Integration tests against a full copy of the store demo workspace.

mod store_demo;
