//! Contract interfaces the daemons call.
//!
//! Each interface lists only the functions the daemons use. Views that return a block height or
//! a count return `uint256`; callers narrow them after decoding.

#![allow(missing_docs)]

use alloy::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IRocketStorage {
        function getAddress(bytes32 key) external view returns (address);
        function getBool(bytes32 key) external view returns (bool);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IERC20 {
        function totalSupply() external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketTokenGGP {
        function swapTokens(uint256 amount) external;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketTokenRETH {
        function getTotalCollateral() external view returns (uint256);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IPriceOracle {
        function getRateToEth(address srcToken, bool useSrcWrappers) external view returns (uint256);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketNetworkPrices {
        function getPricesBlock() external view returns (uint256);
        function getLatestReportableBlock() external view returns (uint256);
        function inConsensus() external view returns (bool);
        function getGGPPrice() external view returns (uint256);
        function submitPrices(uint256 block, uint256 ggpPrice, uint256 effectiveGgpStake) external;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketNetworkBalances {
        function getBalancesBlock() external view returns (uint256);
        function getLatestReportableBlock() external view returns (uint256);
        function submitBalances(uint256 block, uint256 totalEth, uint256 stakingEth, uint256 rethSupply) external;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketDepositPool {
        function getBalance() external view returns (uint256);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketNodeStaking {
        function calculateTotalEffectiveGGPStake(uint256 offset, uint256 limit, uint256 ggpPrice) external view returns (uint256);
        function getNodeGGPStake(address node) external view returns (uint256);
        function getNodeMinimumGGPStake(address node) external view returns (uint256);
        function getNodeGGPStakedTime(address node) external view returns (uint256);
        function getNodeMinipoolLimit(address node) external view returns (uint256);
        function stakeGGP(uint256 amount) external;
        function withdrawGGP(uint256 amount) external;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketNodeDeposit {
        function getDepositType(uint256 amount) external view returns (uint8);
        function deposit(
            uint256 minimumNodeFee,
            bytes validatorPubkey,
            bytes validatorSignature,
            bytes32 depositDataRoot,
            uint256 salt,
            address expectedMinipoolAddress
        ) external payable;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketMinipoolFactory {
        function getExpectedAddress(address node, uint8 depositType, uint256 salt) external view returns (address);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketMinipoolManager {
        function getMinipoolCount() external view returns (uint256);
        function getMinipoolAt(uint256 index) external view returns (address);
        function getNodeMinipoolCount(address node) external view returns (uint256);
        function getNodeMinipoolAt(address node, uint256 index) external view returns (address);
        function getMinipoolPubkey(address minipool) external view returns (bytes);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketMinipool {
        function getStatus() external view returns (uint8);
        function getUserDepositBalance() external view returns (uint256);
        function stake(bytes validatorSignature, bytes32 depositDataRoot) external;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketClaim {
        function getClaimRewardsAmount(address node) external view returns (uint256);
        function claim() external;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketDAONodeTrusted {
        function getMemberIsValid(address node) external view returns (bool);
        function getMemberProposalExecutedTime(string proposalType, address node) external view returns (uint256);
        function getMemberUnbondedValidatorCount(address node) external view returns (uint256);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketDAONodeTrustedActions {
        function actionJoin() external;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketDAONodeTrustedSettingsProposals {
        function getActionTime() external view returns (uint256);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketDAONodeTrustedSettingsMembers {
        function getGGPBond() external view returns (uint256);
        function getMinipoolUnbondedMax() external view returns (uint256);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketDAOProtocolSettingsNetwork {
        function getSubmitPricesEnabled() external view returns (bool);
        function getSubmitBalancesEnabled() external view returns (bool);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketDAOProtocolSettingsRewards {
        function getRewardsClaimIntervalTime() external view returns (uint256);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketDAOProtocolSettingsAuction {
        function getLotMinimumEthValue() external view returns (uint256);
        function getCreateLotEnabled() external view returns (bool);
        function getBidOnLotEnabled() external view returns (bool);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketDAOProtocolSettingsNode {
        function getDepositEnabled() external view returns (bool);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRocketAuctionManager {
        function getRemainingGGPBalance() external view returns (uint256);
        function getLotExists(uint256 lot) external view returns (bool);
        function getLotEndBlock(uint256 lot) external view returns (uint256);
        function getLotRemainingGGPAmount(uint256 lot) external view returns (uint256);
        function getLotGGPRecovered(uint256 lot) external view returns (bool);
        function createLot() external;
        function placeBid(uint256 lot) external payable;
        function recoverUnclaimedGGP(uint256 lot) external;
    }
}
