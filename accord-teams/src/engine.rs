//! The Team Formation Engine (C3): composes a Team for a Task via one of
//! the enumerated strategies, scores and ranks candidates, and feeds
//! collaboration-score updates back into the Entity Store.

use std::collections::{HashMap, HashSet};

use accord_core::{
    Agent, AgentId, Capability, CapabilityId, Role, Task, Team, TeamFormationConfig, TeamId,
    TeamStatus,
};
use accord_storage::{AgentRepository, CapabilityRepository, TaskRepository, TeamRepository};
use tracing::{debug, info};

use crate::diversity::{build_role_set, fit_agents_to_roles, greedy_set_cover};
use crate::error::{Error, Result};
use crate::strategy::{spec_match, FormationStrategy};

/// The well-known capability names the mandatory Team Coordinator role
/// requires, per spec.md §4.3's diversity algorithm.
const COORDINATOR_CAPABILITY_NAMES: [&str; 3] = ["coordination", "planning", "communication"];

#[derive(Clone)]
pub struct TeamFormationEngine {
    agents: AgentRepository,
    capabilities: CapabilityRepository,
    tasks: TaskRepository,
    teams: TeamRepository,
    config: TeamFormationConfig,
}

impl TeamFormationEngine {
    pub fn new(
        agents: AgentRepository,
        capabilities: CapabilityRepository,
        tasks: TaskRepository,
        teams: TeamRepository,
        config: TeamFormationConfig,
    ) -> Self {
        Self {
            agents,
            capabilities,
            tasks,
            teams,
            config,
        }
    }

    pub fn get_team(&self, team_id: TeamId) -> Result<Team> {
        self.teams.get(team_id).map_err(Into::into)
    }

    /// `FindSuitableTeams(requiredCaps)` — teams (not disbanded) whose
    /// capability set is a superset of what's requested. Named in §6 but
    /// left undetailed in §4.3; see DESIGN.md for the grounding of this
    /// reading.
    pub fn find_suitable_teams(&self, required_caps: &HashSet<CapabilityId>) -> Vec<Team> {
        self.teams
            .list()
            .into_iter()
            .filter(|t| t.status != TeamStatus::Disbanded)
            .filter(|t| required_caps.is_subset(&t.capabilities))
            .collect()
    }

    /// `DisbandTeam(teamId)`.
    pub fn disband_team(&self, team_id: TeamId) -> Result<Team> {
        let mut team = self.teams.get(team_id)?;
        let expected = team.version_counter;
        team.disband();
        self.teams.save_versioned(team.clone(), expected)?;
        info!(team_id = %team_id, "team disbanded");
        Ok(team)
    }

    /// `UpdateCollaborationScores(teamId, successRating)`.
    pub fn update_collaboration_scores(&self, team_id: TeamId, success_rating: f64) -> Result<Team> {
        if !(0.0..=1.0).contains(&success_rating) {
            return Err(Error::invalid_argument("successRating must be in [0, 1]"));
        }
        let team = self.teams.get(team_id)?;
        for agent_id in &team.agents {
            let mut agent = self.agents.get(*agent_id)?;
            agent.apply_collaboration_feedback(success_rating);
            self.agents.save(agent)?;
        }
        debug!(team_id = %team_id, success_rating, "updated collaboration scores");
        Ok(team)
    }

    /// `Recommend(taskId, count)`: run every non-diversity strategy in the
    /// spec's declared order, sort by composite score descending, truncate.
    pub async fn recommend(&self, task_id: accord_core::TaskId, count: usize) -> Result<Vec<Team>> {
        let mut teams = Vec::new();
        for strategy in FormationStrategy::recommend_order() {
            match self.form_team(task_id, strategy).await {
                Ok(team) => teams.push(team),
                Err(e) if e.is_no_agents_available() => continue,
                Err(other) => return Err(other),
            }
        }
        teams.sort_by(|a, b| {
            let score_a = a.performance_metrics.get("compositeScore").copied().unwrap_or(0.0);
            let score_b = b.performance_metrics.get("compositeScore").copied().unwrap_or(0.0);
            score_b.total_cmp(&score_a)
        });
        teams.truncate(count);
        Ok(teams)
    }

    /// `FormTeam(taskId, strategy)`.
    pub async fn form_team(&self, task_id: accord_core::TaskId, strategy: FormationStrategy) -> Result<Team> {
        let task = self
            .tasks
            .get(task_id)
            .map_err(|_| Error::not_found("Task", task_id.to_string()))?;

        let available = self.agents.find_available();
        if available.is_empty() {
            return Err(Error::no_agents_available());
        }

        let mut team = Team::new(format!("Team for {}", task.name), task_id, strategy.tag());

        if strategy == FormationStrategy::Diversity {
            self.form_diversity(&mut team, &task, &available)?;
        } else {
            self.form_by_scoring(&mut team, &task, &available, strategy)?;
        }

        team.finalize_status();
        team.activate();

        let metrics = self.compute_metrics(&team, &task, &available);
        team.performance_metrics = metrics;

        self.teams.save_versioned(team.clone(), 0)?;
        info!(team_id = %team.id, task_id = %task_id, strategy = strategy.tag(), status = ?team.status, "formed team");
        Ok(team)
    }

    fn form_by_scoring(
        &self,
        team: &mut Team,
        task: &Task,
        available: &[Agent],
        strategy: FormationStrategy,
    ) -> Result<()> {
        let mut roles: Vec<Role> = task.required_roles.clone();
        roles.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut assigned: HashSet<AgentId> = HashSet::new();
        let mut leader_assigned = false;

        for role in &mut roles {
            let candidate = available
                .iter()
                .filter(|a| !assigned.contains(&a.id))
                .filter(|a| a.capability_match(&role.required_capabilities) >= self.config.capability_match_threshold)
                .max_by(|a, b| {
                    let score_a = strategy.score(a, role);
                    let score_b = strategy.score(b, role);
                    score_a
                        .total_cmp(&score_b)
                        .then(a.performance_rating.total_cmp(&b.performance_rating))
                        .then(b.cost_per_token.total_cmp(&a.cost_per_token))
                        .then(b.id.cmp(&a.id))
                });

            if let Some(agent) = candidate {
                let role_index = team.roles.len();
                team.roles.push(role.clone());
                team.assign_role(role_index, agent.id, &agent.capabilities);
                assigned.insert(agent.id);
                if role.priority > 1 && !leader_assigned {
                    team.set_leader(agent.id);
                    leader_assigned = true;
                }
            } else {
                team.roles.push(role.clone());
            }
        }
        Ok(())
    }

    fn form_diversity(&self, team: &mut Team, task: &Task, available: &[Agent]) -> Result<()> {
        let coordination_caps: HashSet<CapabilityId> = COORDINATOR_CAPABILITY_NAMES
            .iter()
            .map(|name| self.resolve_capability(name, "coordination"))
            .collect::<Result<_>>()?;

        let all_capabilities = self.capabilities.list();
        let roles = build_role_set(&task.required_capabilities, &all_capabilities, &coordination_caps);

        let selected_ids = greedy_set_cover(&task.required_capabilities, available);
        let selected: Vec<Agent> = selected_ids
            .iter()
            .filter_map(|id| available.iter().find(|a| a.id == *id).cloned())
            .collect();

        let fitted = fit_agents_to_roles(&roles, &selected);
        let mut fitted_role_indices: HashSet<usize> = HashSet::new();
        let mut team_roles = roles.clone();

        for (role_idx, agent) in &fitted {
            let role = &mut team_roles[*role_idx];
            role.assign(agent.id, team.id);
            fitted_role_indices.insert(*role_idx);
        }

        // Any role still unfilled: fall back to the remaining pool by
        // `hasAllCapabilities`.
        let mut used: HashSet<AgentId> = fitted.iter().map(|(_, a)| a.id).collect();
        for (idx, role) in team_roles.iter_mut().enumerate() {
            if fitted_role_indices.contains(&idx) {
                continue;
            }
            if role.required_capabilities.is_empty() {
                continue;
            }
            if let Some(agent) = available
                .iter()
                .filter(|a| !used.contains(&a.id))
                .find(|a| a.has_all_capabilities(&role.required_capabilities))
            {
                role.assign(agent.id, team.id);
                used.insert(agent.id);
            }
        }

        team.roles = team_roles;
        for role in &team.roles {
            if let Some(agent_id) = role.assigned_agent {
                if let Some(agent) = available.iter().find(|a| a.id == agent_id) {
                    team.agents.insert(agent_id);
                    team.capabilities.extend(agent.capabilities.iter().copied());
                }
            }
        }

        // Leader: highest performanceRating among selected (falling back to
        // whoever ended up on the team if the selected pool came up empty).
        let leader_pool: Vec<&Agent> = if !selected.is_empty() {
            selected.iter().collect()
        } else {
            available.iter().filter(|a| team.agents.contains(&a.id)).collect()
        };
        if let Some(leader) = leader_pool
            .iter()
            .max_by(|a, b| a.performance_rating.total_cmp(&b.performance_rating))
        {
            team.set_leader(leader.id);
        }

        Ok(())
    }

    fn resolve_capability(&self, name: &str, category: &str) -> Result<CapabilityId> {
        if let Some(existing) = self
            .capabilities
            .list()
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
        {
            return Ok(existing.id);
        }
        let capability = Capability::new(name, category);
        let id = capability.id;
        self.capabilities.save(capability)?;
        Ok(id)
    }

    fn compute_metrics(&self, team: &Team, task: &Task, available: &[Agent]) -> HashMap<String, f64> {
        let members: Vec<&Agent> = available.iter().filter(|a| team.agents.contains(&a.id)).collect();

        let coverage = if task.required_capabilities.is_empty() {
            1.0
        } else {
            let covered = team.capabilities.intersection(&task.required_capabilities).count();
            covered as f64 / task.required_capabilities.len() as f64
        };

        let performance = if members.is_empty() {
            0.0
        } else {
            members.iter().map(|a| a.performance_rating).sum::<f64>() / members.len() as f64 / 10.0
        };

        let cost_efficiency = if members.is_empty() {
            1.0
        } else {
            let mean_cost = members.iter().map(|a| a.cost_per_token).sum::<f64>() / members.len() as f64;
            1.0 - (mean_cost / 0.01).min(1.0)
        };

        let specialization = if team.roles.is_empty() || members.is_empty() {
            0.0
        } else {
            let sum: f64 = team
                .roles
                .iter()
                .map(|role| {
                    members
                        .iter()
                        .map(|agent| spec_match(agent, role))
                        .fold(0.0_f64, f64::max)
                })
                .sum();
            sum / team.roles.len() as f64
        };

        let composite = 0.4 * coverage + 0.3 * performance + 0.2 * specialization + 0.1 * cost_efficiency;

        let mut metrics = HashMap::new();
        metrics.insert("capabilityCoverage".to_string(), coverage);
        metrics.insert("performanceRating".to_string(), performance);
        metrics.insert("costEfficiency".to_string(), cost_efficiency);
        metrics.insert("specialization".to_string(), specialization);
        metrics.insert("compositeScore".to_string(), composite);
        metrics
    }
}
