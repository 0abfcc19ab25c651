use std::sync::OnceLock;

use gcn_bytecode::{InputUsageSlot, UsageType, MAX_USER_DATA_REGS};
use tracing::{debug, trace};

use crate::error::ResolveError;
use crate::resource::{DescriptorKind, ResourceBuffer, ShaderResource, UserData};

/// Resolves a shader's declared input usage slots against the host-supplied
/// user-data table.
///
/// Resolution runs three independent passes over the slot list (immediate
/// values that must sit in the inline register window, immediates that may
/// spill to the EUD table, and pointer tables), then a closed-world
/// validation sweep that rejects any slot the resolver does not understand.
/// The passes never depend on each other's output; their fixed order only
/// fixes the resulting table order.
pub(crate) struct BindingResolver<'m, 'a> {
    slots: &'m [InputUsageSlot],
    user_data: &'m [UserData<'a>],
    eud: &'m OnceLock<&'a [u32]>,
}

impl<'m, 'a> BindingResolver<'m, 'a> {
    pub(crate) fn new(
        slots: &'m [InputUsageSlot],
        user_data: &'m [UserData<'a>],
        eud: &'m OnceLock<&'a [u32]>,
    ) -> Self {
        BindingResolver {
            slots,
            user_data,
            eud,
        }
    }

    /// Runs full resolution and returns the linear resource table.
    pub(crate) fn resolve_all(&self) -> Result<Vec<ShaderResource<'a>>, ResolveError> {
        let mut table = Vec::new();
        self.resolve_immediates(&mut table)?;
        self.resolve_imm_or_eud(&mut table)?;
        self.resolve_pointer_tables()?;
        self.validate_slots()?;
        debug!(
            slots = self.slots.len(),
            resolved = table.len(),
            "resolved shader resource table"
        );
        Ok(table)
    }

    /// Immediate small values that must live inside the inline register
    /// window; a missing host entry is fatal.
    fn resolve_immediates(&self, table: &mut Vec<ShaderResource<'a>>) -> Result<(), ResolveError> {
        for slot in self.slots {
            let Some(usage) = slot.usage() else {
                continue; // rejected by the validation sweep
            };
            match usage {
                UsageType::ImmGdsCounterRange
                | UsageType::ImmGdsMemoryRange
                | UsageType::ImmLdsEsGsSize
                | UsageType::PtrInternalGlobalTable
                | UsageType::ImmGdsKickRingBufferOffset
                | UsageType::ImmVertexRingBufferOffset
                | UsageType::PtrDispatchDraw
                | UsageType::ImmDispatchDrawInstances => {
                    table.push(self.user_data_resource(usage, slot.start_register.into())?);
                }
                UsageType::ImmShaderResourceTable => {
                    return Err(ResolveError::ShaderResourceTableUnsupported {
                        register: slot.start_register.into(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Descriptor immediates that live inline when their register is below
    /// the inline window, and in the EUD table otherwise.
    fn resolve_imm_or_eud(&self, table: &mut Vec<ShaderResource<'a>>) -> Result<(), ResolveError> {
        for slot in self.slots {
            let Some(usage) = slot.usage() else {
                continue;
            };
            match usage {
                UsageType::ImmResource
                | UsageType::ImmRwResource
                | UsageType::ImmSampler
                | UsageType::ImmConstBuffer
                | UsageType::ImmVertexBuffer => {
                    let register = u32::from(slot.start_register);
                    let res = if register < MAX_USER_DATA_REGS {
                        self.user_data_resource(usage, register)?
                    } else {
                        self.eud_resource(usage, register)?
                    };
                    table.push(res);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Indirect resource/sampler/const-buffer/vertex-buffer tables.
    ///
    /// Recognized but deliberately unresolved: dereferencing these tables is
    /// deferred to draw time. This is the extension point for compile-time
    /// indirection, should a title ever require it.
    fn resolve_pointer_tables(&self) -> Result<(), ResolveError> {
        for slot in self.slots {
            match slot.usage() {
                Some(
                    UsageType::PtrResourceTable
                    | UsageType::PtrRwResourceTable
                    | UsageType::PtrConstBufferTable
                    | UsageType::PtrSamplerTable
                    | UsageType::PtrVertexBufferTable,
                ) => {
                    trace!(
                        usage = ?slot.usage(),
                        register = slot.start_register,
                        "pointer-table slot left for draw-time resolution"
                    );
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Closed-world check: every declared slot must carry a usage type the
    /// resolver knows how to treat. Anything else is an unsupported shader
    /// feature, not something to skip.
    fn validate_slots(&self) -> Result<(), ResolveError> {
        for (idx, slot) in self.slots.iter().enumerate() {
            let Some(usage) = slot.usage() else {
                return Err(ResolveError::UnrecognizedUsage {
                    slot: idx,
                    raw: slot.usage_type,
                });
            };
            let handled = matches!(
                usage,
                UsageType::ImmResource
                    | UsageType::ImmRwResource
                    | UsageType::ImmSampler
                    | UsageType::ImmConstBuffer
                    | UsageType::ImmVertexBuffer
                    | UsageType::ImmShaderResourceTable
                    | UsageType::SubPtrFetchShader
                    | UsageType::PtrExtendedUserData
                    | UsageType::PtrResourceTable
                    | UsageType::PtrRwResourceTable
                    | UsageType::PtrConstBufferTable
                    | UsageType::PtrVertexBufferTable
                    | UsageType::PtrSamplerTable
                    | UsageType::PtrInternalGlobalTable
                    | UsageType::ImmGdsCounterRange
                    | UsageType::ImmGdsMemoryRange
                    | UsageType::ImmLdsEsGsSize
                    | UsageType::ImmGdsKickRingBufferOffset
                    | UsageType::ImmVertexRingBufferOffset
                    | UsageType::PtrDispatchDraw
                    | UsageType::ImmDispatchDrawInstances
            );
            if !handled {
                return Err(ResolveError::UnsupportedUsage { slot: idx, usage });
            }
        }
        Ok(())
    }

    /// Classifies resolved descriptors for code generation.
    ///
    /// Only sampler, resource and const-buffer slots produce an entry, and
    /// lookup goes through the host table alone: registers are assumed inline
    /// at this stage. `ImmSampler` is always an S# regardless of the slot's
    /// resource-type flag, which the console ABI leaves describing a V# for
    /// samplers.
    pub(crate) fn find_resource_buffers(&self) -> Result<Vec<ResourceBuffer<'a>>, ResolveError> {
        let mut buffers = Vec::new();
        for slot in self.slots {
            let Some(usage) = slot.usage() else {
                continue;
            };
            let kind = match usage {
                UsageType::ImmSampler => DescriptorKind::SSharp,
                UsageType::ImmResource | UsageType::ImmConstBuffer => {
                    if slot.resource_type() == 0 {
                        DescriptorKind::VSharp
                    } else {
                        DescriptorKind::TSharp
                    }
                }
                _ => continue,
            };
            let resource = self.user_data_resource(usage, slot.start_register.into())?;
            buffers.push(ResourceBuffer {
                kind,
                usage,
                resource,
            });
        }
        debug!(count = buffers.len(), "classified resource buffers");
        Ok(buffers)
    }

    fn find_in_user_data(&self, register: u32) -> Option<&'a [u32]> {
        self.user_data
            .iter()
            .find(|entry| entry.start_register == register)
            .map(|entry| entry.data)
    }

    /// Looks a slot up in the host table and sizes it; the resulting view is
    /// exactly the descriptor's dwords.
    fn user_data_resource(
        &self,
        usage: UsageType,
        register: u32,
    ) -> Result<ShaderResource<'a>, ResolveError> {
        let data = self
            .find_in_user_data(register)
            .ok_or(ResolveError::MissingBinding { usage, register })?;
        let need = usage.size_in_dwords() as usize;
        if data.len() < need {
            return Err(ResolveError::ResourceTooSmall {
                usage,
                register,
                have: data.len(),
                need,
            });
        }
        Ok(ShaderResource {
            start_register: register,
            size_dwords: usage.size_in_dwords(),
            data: &data[..need],
        })
    }

    /// Resolves an EUD-resident descriptor at `register - MAX_USER_DATA_REGS`
    /// dwords into the EUD table, bounds-checked against the table the host
    /// actually bound.
    fn eud_resource(
        &self,
        usage: UsageType,
        register: u32,
    ) -> Result<ShaderResource<'a>, ResolveError> {
        let eud = self.eud_table()?;
        let offset = (register - MAX_USER_DATA_REGS) as usize;
        let need = usage.size_in_dwords() as usize;
        let data = eud
            .get(offset..offset + need)
            .ok_or(ResolveError::EudOutOfBounds {
                offset,
                need,
                len: eud.len(),
            })?;
        Ok(ShaderResource {
            start_register: register,
            size_dwords: usage.size_in_dwords(),
            data,
        })
    }

    /// Locates the EUD table: the user-data entry bound to the (last
    /// declared) `PtrExtendedUserData` slot. Resolved once and cached for the
    /// module's lifetime.
    fn eud_table(&self) -> Result<&'a [u32], ResolveError> {
        if let Some(eud) = self.eud.get() {
            return Ok(eud);
        }

        let mut register = None;
        for slot in self.slots {
            if slot.usage() == Some(UsageType::PtrExtendedUserData) {
                // Shaders are expected to declare at most one; the last
                // declaration wins in the degenerate case.
                register = Some(u32::from(slot.start_register));
            }
        }
        let register = register.ok_or(ResolveError::MissingEudPointer)?;
        let table = self
            .find_in_user_data(register)
            .ok_or(ResolveError::MissingBinding {
                usage: UsageType::PtrExtendedUserData,
                register,
            })?;
        debug!(register, len = table.len(), "located extended user data table");
        Ok(self.eud.get_or_init(|| table))
    }
}
