//! On-chain composition of Set tokens.

use alloy::{
    eips::BlockId,
    primitives::{Address, I256, U256},
    providers::Provider,
};

use crate::{abi::set_token::SetToken, error::ProviderError};

/// Default position of a Set component, held by the Set token contract itself.
const DEFAULT_POSITION_STATE: u8 = 0;

/// Units of a component held per one whole Set token (1e18 base units).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentPosition {
    pub component: Address,
    pub unit: U256,
}

/// Snapshot of a Set token's supply and default positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetComposition {
    /// Manager allowed to call the trade module on behalf of the Set.
    pub manager: Address,
    pub total_supply: U256,
    pub positions: Vec<ComponentPosition>,
}

impl SetComposition {
    /// Position unit of the component, `None` if the Set does not hold it.
    pub fn unit_of(&self, component: Address) -> Option<U256> {
        self.positions
            .iter()
            .find(|p| p.component == component)
            .map(|p| p.unit)
    }
}

/// Reader of Set token compositions.
#[async_trait::async_trait]
pub trait SetCompositionReader: Send + Sync {
    /// Reads the manager, total supply and the default positions of `set`.
    /// Positions are limited to `components` unless it is empty.
    async fn fetch_composition(
        &self,
        set: Address,
        components: &[Address],
    ) -> Result<SetComposition, ProviderError>;
}

/// Reads compositions directly from the Set token contracts at the latest block.
#[derive(Clone, Debug)]
pub struct OnChainSetReader<P> {
    provider: P,
}

impl<P: Provider + Clone> OnChainSetReader<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Pins the latest block number so that all calls observe the same state.
    async fn latest_block(&self) -> Result<BlockId, ProviderError> {
        Ok(BlockId::number(self.provider.get_block_number().await?))
    }
}

#[async_trait::async_trait]
impl<P: Provider + Clone + 'static> SetCompositionReader for OnChainSetReader<P> {
    async fn fetch_composition(
        &self,
        set: Address,
        components: &[Address],
    ) -> Result<SetComposition, ProviderError> {
        let block_id = self.latest_block().await?;
        let instance = SetToken::new(set, self.provider.clone());

        let (manager_call, total_supply_call, positions_call) = (
            instance.manager().block(block_id),
            instance.totalSupply().block(block_id),
            instance.getPositions().block(block_id),
        );
        let (manager, total_supply, positions) = futures::try_join!(
            manager_call.call().into_future(),
            total_supply_call.call().into_future(),
            positions_call.call().into_future(),
        )
        .map_err(ProviderError::from)?;

        let positions = default_positions(positions, components);
        tracing::debug!(%set, %manager, %total_supply, positions = positions.len(), "Read set composition");

        Ok(SetComposition {
            manager,
            total_supply,
            positions,
        })
    }
}

/// Keeps the positive default positions, limited to `components` unless it is empty.
fn default_positions(
    positions: Vec<SetToken::Position>,
    components: &[Address],
) -> Vec<ComponentPosition> {
    positions
        .into_iter()
        .filter(|p| p.positionState == DEFAULT_POSITION_STATE && p.unit > I256::ZERO)
        .filter(|p| components.is_empty() || components.contains(&p.component))
        .map(|p| ComponentPosition {
            component: p.component,
            unit: p.unit.into_raw(),
        })
        .collect()
}
