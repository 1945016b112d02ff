//! Counter contract bindings.

use alloy::sol;

/// Constructor argument used by the demo deployment.
pub const INITIAL_COUNT: u64 = 100;

/// Value written by the demo `setCount` call.
pub const DEMO_SET_COUNT: u64 = 999;

// Counter contract interface
sol! {
    interface ICounter {
        function getCount() external view returns (uint256);
        function increment() external;
        function setCount(uint256 _count) external;
    }
}

/// Human-readable signatures of the counter methods.
pub mod signatures {
    /// Read the current count.
    pub const GET_COUNT: &str = "getCount() returns (uint256)";
    /// Increment the count by one.
    pub const INCREMENT: &str = "increment()";
    /// Overwrite the count.
    pub const SET_COUNT: &str = "setCount(uint256)";
}
