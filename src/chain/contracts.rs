//! Fixed contract ABIs
//!
//! The Solidity contracts are external collaborators; only their call
//! interfaces are declared here.

use alloy::sol;

sol! {
    /// Global user registry plus the ACL surface for stacked items
    #[derive(Debug)]
    contract Dashboard {
        function createUser(address wallet, string username, address profile, string extra);
        function findUsername(address wallet) external view returns (string);
        function findProfile(address wallet) external view returns (address);
        function findRootIPFS(address wallet) external view returns (string);
        function findUser(string username) external view returns (address);
        function grantReadAccess(address owner, uint256 itemId, address reader);
        function revokeAccess(address owner, uint256 itemId, address reader);
    }

    /// Per-user contract holding that user's stacked items
    #[derive(Debug)]
    contract Profile {
        /// Emitted once per successful stackItem with the assigned id
        event StackContent(uint256 _itemId);

        function lastItemId() external view returns (uint256);
        function stackItem(string title, string description, address meta, address acl);
        function items(uint256 itemId) external view returns (string title, string description, address meta, address acl);
    }

    /// Permissioned file referenced by an item's meta address
    #[derive(Debug)]
    contract PermissionedFile {
        function permissions() external view returns (address[]);
    }

    /// Token faucet backing wallet top-ups
    #[derive(Debug)]
    contract Faucet {
        function requestFreeToken(address beneficiary, uint256 amount);
    }
}
