// lottery/src/bindings.rs
#![allow(clippy::all)]
use ethers::prelude::abigen;

// Bytecode comes from the compiled artifacts at deploy time; these bindings only call.
abigen!(
    Lottery,
    r#"[
        event LotteryEnter(address indexed player)
        event RequestedLotteryWinner(uint256 indexed requestId)
        event WinnerPicked(address indexed winner)
        function enterLottery() external payable
        function checkUpkeep(bytes checkData) external returns (bool upkeepNeeded, bytes performData)
        function performUpkeep(bytes performData) external
        function getEntryFee() external view returns (uint256)
        function getNumberOfPlayers() external view returns (uint256)
        function getRecentWinner() external view returns (address)
        function getLotteryState() external view returns (uint8)
        function getPlayer(uint256 index) external view returns (address)
        function getLatestTimeStamp() external view returns (uint256)
        function getInterval() external view returns (uint256)
    ]"#,
    event_derives(serde::Deserialize, serde::Serialize)
);

abigen!(
    VRFCoordinatorV2Mock,
    r#"[
        event SubscriptionCreated(uint64 indexed subId, address owner)
        event SubscriptionFunded(uint64 indexed subId, uint256 oldBalance, uint256 newBalance)
        event ConsumerAdded(uint64 indexed subId, address consumer)
        function createSubscription() external returns (uint64 subId)
        function fundSubscription(uint64 subId, uint96 amount) external
        function addConsumer(uint64 subId, address consumer) external
        function fulfillRandomWords(uint256 requestId, address consumer) external
    ]"#,
    event_derives(serde::Deserialize, serde::Serialize)
);

// END OF FILE: lottery/src/bindings.rs
