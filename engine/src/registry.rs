//! Group membership registry.

use std::collections::HashSet;

use serde::Serialize;

use splitsettle_common::{Address, GroupId, Result, SplitSettleError};

/// Minimum number of members at group creation.
pub const MIN_GROUP_MEMBERS: usize = 2;

/// A group of addresses sharing one debt ledger.
///
/// `members` keeps creation order followed by join order; `member_set` holds
/// exactly the same addresses for constant-time membership checks.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    /// Group identifier.
    pub id: GroupId,
    members: Vec<Address>,
    #[serde(skip)]
    member_set: HashSet<Address>,
}

impl Group {
    fn new(id: GroupId, members: Vec<Address>) -> Self {
        let member_set = members.iter().copied().collect();
        Self {
            id,
            members,
            member_set,
        }
    }

    /// Members in creation-then-join order.
    pub fn members(&self) -> &[Address] {
        &self.members
    }

    /// Check membership.
    pub fn contains(&self, account: &Address) -> bool {
        self.member_set.contains(account)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false for a registered group.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Fail with `NotAMember` unless `account` belongs to the group.
    pub fn require_member(&self, account: &Address) -> Result<()> {
        if !self.contains(account) {
            return Err(SplitSettleError::NotAMember {
                group_id: self.id,
                account: *account,
            });
        }
        Ok(())
    }

    fn push(&mut self, account: Address) {
        self.member_set.insert(account);
        self.members.push(account);
    }
}

/// Owns every group. Ids are assigned sequentially from zero and groups are
/// never removed, so a group's id is its index.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: Vec<Group>,
}

impl GroupRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a creation list without registering anything.
    pub fn validate_members(members: &[Address]) -> Result<()> {
        if members.len() < MIN_GROUP_MEMBERS {
            return Err(SplitSettleError::InsufficientMembers {
                count: members.len(),
            });
        }

        let mut seen = HashSet::with_capacity(members.len());
        for member in members {
            if !seen.insert(member) {
                return Err(SplitSettleError::DuplicateMember(*member));
            }
        }

        Ok(())
    }

    /// Register a group with the given members, in order.
    pub fn create_group(&mut self, members: Vec<Address>) -> Result<GroupId> {
        Self::validate_members(&members)?;

        let id = GroupId::new(self.groups.len() as u64);
        self.groups.push(Group::new(id, members));
        Ok(id)
    }

    /// Append `account` to a group. Returns the new member count.
    pub fn join_group(&mut self, group_id: GroupId, account: Address) -> Result<usize> {
        let group = self.group_mut(group_id)?;
        if group.contains(&account) {
            return Err(SplitSettleError::AlreadyMember { group_id, account });
        }
        group.push(account);
        Ok(group.len())
    }

    /// Look up a group.
    pub fn group(&self, group_id: GroupId) -> Result<&Group> {
        self.groups
            .get(index(group_id))
            .ok_or(SplitSettleError::GroupNotFound(group_id))
    }

    /// Members of a group in order.
    pub fn members(&self, group_id: GroupId) -> Result<Vec<Address>> {
        Ok(self.group(group_id)?.members().to_vec())
    }

    /// Check membership; unknown groups have no members.
    pub fn is_member(&self, group_id: GroupId, account: &Address) -> bool {
        self.group(group_id)
            .map(|g| g.contains(account))
            .unwrap_or(false)
    }

    /// Number of groups created so far.
    pub fn group_count(&self) -> u64 {
        self.groups.len() as u64
    }

    fn group_mut(&mut self, group_id: GroupId) -> Result<&mut Group> {
        self.groups
            .get_mut(index(group_id))
            .ok_or(SplitSettleError::GroupNotFound(group_id))
    }
}

fn index(group_id: GroupId) -> usize {
    usize::try_from(group_id.value()).unwrap_or(usize::MAX)
}
