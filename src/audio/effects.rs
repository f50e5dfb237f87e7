use crate::driver::{
    EffectFloat, EffectHandle, EffectKind, EffectSlotHandle, SceneDriver, SourceHandle,
};
use crate::error::DriverError;
use log::debug;
use serde::{Deserialize, Serialize};

/// Auxiliary send used for the reverb route.
pub const REVERB_SEND: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReverbSettings {
    /// Seconds; the driver accepts 0.1 to 20.0
    pub decay_time: f32,
}

impl Default for ReverbSettings {
    fn default() -> Self {
        Self { decay_time: 2.0 }
    }
}

/// Driver objects created by [`apply_reverb`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReverbSend {
    pub effect: EffectHandle,
    pub slot: EffectSlotHandle,
    pub send: u32,
}

/// Create a reverb effect in its own slot and route `source` into it.
pub fn apply_reverb<S: SceneDriver + ?Sized>(
    driver: &S,
    source: SourceHandle,
    settings: &ReverbSettings,
) -> Result<ReverbSend, DriverError> {
    let effect = driver.gen_effect(EffectKind::Reverb)?;
    driver.set_effect_float(effect, EffectFloat::ReverbDecayTime, settings.decay_time)?;

    let slot = driver.gen_effect_slot()?;
    driver.attach_effect(slot, Some(effect))?;
    driver.set_source_send(source, REVERB_SEND, Some(slot))?;

    debug!(
        "{} sends into {} ({}, decay {}s)",
        source, slot, effect, settings.decay_time
    );
    Ok(ReverbSend {
        effect,
        slot,
        send: REVERB_SEND,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::mock::MockScene;
    use mockall::predicate::*;

    #[test]
    fn reverb_is_routed_through_send_zero() {
        let source = SourceHandle::from_raw(1);
        let effect = EffectHandle::from_raw(5);
        let slot = EffectSlotHandle::from_raw(6);
        let mut driver = MockScene::new();

        driver
            .expect_gen_effect()
            .with(eq(EffectKind::Reverb))
            .times(1)
            .returning(move |_| Ok(effect));
        driver
            .expect_set_effect_float()
            .with(eq(effect), eq(EffectFloat::ReverbDecayTime), eq(2.0))
            .times(1)
            .returning(|_, _, _| Ok(()));
        driver
            .expect_gen_effect_slot()
            .times(1)
            .returning(move || Ok(slot));
        driver
            .expect_attach_effect()
            .with(eq(slot), eq(Some(effect)))
            .times(1)
            .returning(|_, _| Ok(()));
        driver
            .expect_set_source_send()
            .with(eq(source), eq(REVERB_SEND), eq(Some(slot)))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let send = apply_reverb(&driver, source, &ReverbSettings::default()).unwrap();
        assert_eq!(
            send,
            ReverbSend {
                effect,
                slot,
                send: 0
            }
        );
    }

    #[test]
    fn unknown_source_fails_routing() {
        let mut driver = MockScene::new();
        driver
            .expect_gen_effect()
            .returning(|_| Ok(EffectHandle::from_raw(1)));
        driver.expect_set_effect_float().returning(|_, _, _| Ok(()));
        driver
            .expect_gen_effect_slot()
            .returning(|| Ok(EffectSlotHandle::from_raw(1)));
        driver.expect_attach_effect().returning(|_, _| Ok(()));
        driver.expect_set_source_send().returning(|source, _, _| {
            Err(DriverError::InvalidName {
                kind: SourceHandle::KIND,
                name: source.raw(),
            })
        });

        let result = apply_reverb(
            &driver,
            SourceHandle::from_raw(42),
            &ReverbSettings::default(),
        );
        assert_eq!(
            result,
            Err(DriverError::InvalidName {
                kind: "source",
                name: 42
            })
        );
    }
}
