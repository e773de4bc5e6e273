//! Solidity bindings for the ProofPass contracts.
//!
//! The contracts themselves are deployed externally; these definitions only
//! mirror the parts of their ABI the client calls or decodes.

use alloy_sol_types::sol;

sol! {
	#![sol(all_derives)]

	/// Soulbound residency pass NFT.
	#[sol(all_derives)]
	interface IResidencyPass {
		/// Pass record as stored on-chain.
		struct Pass {
			string country;
			string region;
			string docCID;
			string metaCID;
			uint256 expiry;
			address issuer;
		}

		/// ERC-721 transfer, emitted on mint before `PassIssued`.
		event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);

		/// Emitted once per successful `issuePass`.
		event PassIssued(
			uint256 indexed passId,
			address indexed to,
			address indexed issuer,
			string country,
			string region,
			string docCID
		);

		function issuePass(
			address to,
			string country,
			string region,
			string docCID,
			string metaCID,
			uint256 expiry
		) external payable returns (uint256 passId);

		function triggerPDPCheck(uint256 passId) external payable;

		function verifyResidency(uint256 passId) external view returns (bool isValid, Pass pass);

		function getPDPFreshness(uint256 passId) external view returns (bool isFresh, uint256 lastChecked);

		function feeAmount() external view returns (uint256 fee);

		function pdpFee() external view returns (uint256 fee);
	}

	/// Registry of notaries allowed to attest residency documents.
	#[sol(all_derives)]
	interface INotaryRegistry {
		function isNotary(address notary) external view returns (bool registered);

		function getNotaryCount() external view returns (uint256 count);

		function addNotary(address notary, string did) external;

		function removeNotary(address notary) external;
	}

	/// Storage provider jurisdiction registrations.
	#[sol(all_derives)]
	interface ISPJurisdiction {
		function isSPCompliant(address sp, string country, string region) external view returns (bool compliant);

		function registerJurisdiction(
			string country,
			string region,
			string vcCID,
			uint256 expiry,
			bytes signature
		) external;
	}
}
