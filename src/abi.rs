#[allow(clippy::too_many_arguments)]
pub mod set_token {
    alloy::sol! {
        /// Read-only subset of the Set Protocol V2 `SetToken` contract.
        #[derive(Debug)]
        #[sol(rpc)]
        interface SetToken {
            /// Position of a single component, `positionState` 0 is a default
            /// (held by the Set itself) and 1 is an external position.
            struct Position {
                address component;
                address module;
                int256 unit;
                uint8 positionState;
                bytes data;
            }

            function manager() external view returns (address);
            function totalSupply() external view returns (uint256);
            function getPositions() external view returns (Position[] memory);
        }
    }
}
