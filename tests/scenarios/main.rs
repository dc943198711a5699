//! Scenario suite for pipeline runs and route resolution

mod helpers;

mod abort_on_failure;
mod continue_on_failure;
mod route_precedence;
