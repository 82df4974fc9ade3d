pub mod orchestration;
pub mod ping;
pub mod scoringmgr;
pub mod servicemgr;
