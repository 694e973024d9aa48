// codec.rs - Payloads exchanged between the relay and a compute module
//
// The compute boundary is textual: requests go out as
// `{"alive_cells": [[x,y],...], "grid_size": [w,h]}` and responses come back
// as `{"alive_cells": [[x,y],...]}`. No bounds checking happens here.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, ComputeError};
use crate::grid::{AliveSet, GridSize};

/// Input to one generation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRequest {
    pub alive_cells: AliveSet,
    pub grid_size: GridSize,
}

/// Live cells after exactly one generation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResponse {
    pub alive_cells: AliveSet,
}

// Relay side

pub fn encode_request(request: &StepRequest) -> Result<String, CodecError> {
    serde_json::to_string(request).map_err(CodecError::Encode)
}

pub fn decode_response(text: &str) -> Result<StepResponse, CodecError> {
    serde_json::from_str(text).map_err(CodecError::Decode)
}

// Module side

pub fn decode_request(text: &str) -> Result<StepRequest, ComputeError> {
    serde_json::from_str(text).map_err(|e| ComputeError::InvalidRequest(e.to_string()))
}

pub fn encode_response(response: &StepResponse) -> Result<String, ComputeError> {
    serde_json::to_string(response).map_err(|e| ComputeError::Other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn request_uses_snake_case_fields() {
        let request = StepRequest {
            alive_cells: [(1, 2)].into_iter().collect(),
            grid_size: GridSize::new(5, 5).unwrap(),
        };
        assert_eq!(
            encode_request(&request).unwrap(),
            r#"{"alive_cells":[[1,2]],"grid_size":[5,5]}"#
        );
    }

    #[test]
    fn missing_alive_cells_fails_decode() {
        assert!(matches!(decode_response("{}"), Err(CodecError::Decode(_))));
        assert!(matches!(decode_response(r#"{"alive_cells":[[1]]}"#), Err(CodecError::Decode(_))));
        assert!(matches!(decode_response("not json"), Err(CodecError::Decode(_))));
    }

    #[test]
    fn extra_response_fields_are_tolerated() {
        let response = decode_response(r#"{"alive_cells":[[0,0]],"generation":4}"#).unwrap();
        assert_eq!(response.alive_cells.len(), 1);
    }

    proptest! {
        #[test]
        fn coordinates_survive_the_compute_boundary(
            cells in proptest::collection::vec((any::<i32>(), any::<i32>()), 0..64),
            width in 1u32..500,
            height in 1u32..500,
        ) {
            let request = StepRequest {
                alive_cells: cells.iter().copied().collect(),
                grid_size: GridSize::new(width, height).unwrap(),
            };
            let decoded = decode_request(&encode_request(&request).unwrap()).unwrap();
            prop_assert_eq!(&decoded, &request);

            let response = StepResponse { alive_cells: request.alive_cells.clone() };
            let back = decode_response(&encode_response(&response).unwrap()).unwrap();
            prop_assert_eq!(back.alive_cells, request.alive_cells);
        }
    }
}
