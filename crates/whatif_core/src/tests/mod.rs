//! Integration tests for the experiment engine
//!
//! Tests are organized by topic:
//! - `sampling` - Scenario and policy generation
//! - `design` - Cross-product designs and run id assignment
//! - `runner` - Parallel execution, fault containment, halting
//! - `aggregate` - Result table assembly and accessors
//! - `cluster` - Scenario discovery by k-means
//! - `scoring` - Input sensitivity scoring

mod support;

mod aggregate;
mod scoring;
