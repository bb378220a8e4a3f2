//! Shared fixtures for pipeline tests

mod github;

pub use github::{
    mock_chart_index, mock_contents_get, mock_contents_put, mock_latest_release,
    mock_pull_request_flow, test_config,
};
