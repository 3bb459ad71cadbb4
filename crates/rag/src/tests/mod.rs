//! Shared test doubles and cross-module scenarios.


mod end_to_end;
